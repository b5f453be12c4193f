use crate::{
    error::Erc20Error, keeper::Keeper, ATTRIBUTE_KEY_AMOUNT, ATTRIBUTE_KEY_COSMOS_COIN,
    ATTRIBUTE_KEY_ERC20_TOKEN, ATTRIBUTE_KEY_RECEIVER, ATTRIBUTE_KEY_SENDER,
    EVENT_TYPE_CONVERT_COIN, EVENT_TYPE_CONVERT_ERC20,
};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use ev_common::{module_address, ERC20_MODULE_NAME};
use ev_context::{Context, Event};
use ev_primitives::{contracts::IERC20MinterBurnerDecimals as Erc20, Coin, Coins, Owner, TokenPair};

fn conversion_event(ty: &str, sender: Address, receiver: Address, amount: U256, pair: &TokenPair) -> Event {
    Event::new(ty)
        .attr(ATTRIBUTE_KEY_SENDER, sender)
        .attr(ATTRIBUTE_KEY_RECEIVER, receiver)
        .attr(ATTRIBUTE_KEY_AMOUNT, amount)
        .attr(ATTRIBUTE_KEY_COSMOS_COIN, &pair.denom)
        .attr(ATTRIBUTE_KEY_ERC20_TOKEN, pair.erc20_address)
}

impl Keeper {
    /// ERC20 balance of `holder`. The query never commits.
    pub fn balance_of(&self, ctx: &mut Context, contract: Address, holder: Address) -> Result<U256, Erc20Error> {
        let call = Erc20::balanceOfCall { account: holder };
        let out = self.evm_keeper.call_evm(
            ctx,
            module_address(ERC20_MODULE_NAME),
            contract,
            call.abi_encode().into(),
            false,
        )?;
        U256::abi_decode(&out).map_err(|err| Erc20Error::EvmCall(format!("failed to retrieve balance: {err}")))
    }

    /// Converts `amount` ERC20 tokens held by `sender` into coins credited to `receiver`.
    ///
    /// `token` is either the coin denomination or the hex contract address of the pair. The
    /// tokens are burned and the escrowed coins released; afterwards the receiver's coin balance
    /// must have risen and the sender's token balance fallen by exactly `amount`. On any error
    /// no state is written.
    pub fn try_convert_erc20_sdk(
        &self,
        ctx: &mut Context,
        sender: Address,
        receiver: Address,
        token: &str,
        amount: U256,
    ) -> Result<(), Erc20Error> {
        let pair = self.minting_enabled(ctx, sender, receiver, token)?;
        ctx.with_cache(|ctx| {
            self.burn_and_unescrow(ctx, &pair, sender, receiver, amount)?;
            ctx.emit_event(conversion_event(EVENT_TYPE_CONVERT_ERC20, sender, receiver, amount, &pair));
            Ok::<_, Erc20Error>(())
        })?;
        tracing::info!(target: "ev_erc20", %sender, %receiver, %amount, denom = %pair.denom, "converted erc20 into coins");
        Ok(())
    }

    /// Converts `coin` held by `sender` into its ERC20 representation credited to `receiver`.
    pub fn convert_coin(
        &self,
        ctx: &mut Context,
        coin: &Coin,
        sender: Address,
        receiver: Address,
    ) -> Result<(), Erc20Error> {
        coin.validate()?;
        let pair = self.minting_enabled(ctx, sender, receiver, &coin.denom)?;
        ctx.with_cache(|ctx| {
            match pair.contract_owner {
                Owner::Module => self.escrow_and_mint(ctx, &pair, coin, sender, receiver)?,
                Owner::External => self.burn_and_transfer(ctx, &pair, coin, sender, receiver)?,
            }
            ctx.emit_event(conversion_event(EVENT_TYPE_CONVERT_COIN, sender, receiver, coin.amount, &pair));
            Ok::<_, Erc20Error>(())
        })?;
        tracing::info!(target: "ev_erc20", %sender, %receiver, %coin, "converted coins into erc20");
        Ok(())
    }

    /// Converts `amount` tokens of `contract` held by `sender` into coins credited to `receiver`.
    pub fn convert_erc20(
        &self,
        ctx: &mut Context,
        contract: Address,
        amount: U256,
        sender: Address,
        receiver: Address,
    ) -> Result<(), Erc20Error> {
        let pair = self.minting_enabled(ctx, sender, receiver, &contract.to_string())?;
        ctx.with_cache(|ctx| {
            match pair.contract_owner {
                Owner::Module => self.burn_and_unescrow(ctx, &pair, sender, receiver, amount)?,
                Owner::External => self.transfer_and_mint(ctx, &pair, sender, receiver, amount)?,
            }
            ctx.emit_event(conversion_event(EVENT_TYPE_CONVERT_ERC20, sender, receiver, amount, &pair));
            Ok::<_, Erc20Error>(())
        })?;
        tracing::info!(target: "ev_erc20", %sender, %receiver, %amount, %contract, "converted erc20 into coins");
        Ok(())
    }

    /// Module-owned pair, coin to token: escrow the coins and mint tokens.
    fn escrow_and_mint(
        &self,
        ctx: &mut Context,
        pair: &TokenPair,
        coin: &Coin,
        sender: Address,
        receiver: Address,
    ) -> Result<(), Erc20Error> {
        let contract = pair.erc20_address;
        let coins = Coins::from_coin(coin.clone())?;
        let token_before = self.balance_of(ctx, contract, receiver)?;

        self.bank_keeper.send_coins_from_account_to_module(ctx, sender, ERC20_MODULE_NAME, &coins)?;
        self.call_token(ctx, module_address(ERC20_MODULE_NAME), contract, &Erc20::mintCall {
            to: receiver,
            amount: coin.amount,
        })?;

        self.expect_token_balance(ctx, contract, receiver, token_before.saturating_add(coin.amount))
    }

    /// Externally-owned pair, coin to token: burn the coins and release escrowed tokens.
    fn burn_and_transfer(
        &self,
        ctx: &mut Context,
        pair: &TokenPair,
        coin: &Coin,
        sender: Address,
        receiver: Address,
    ) -> Result<(), Erc20Error> {
        let contract = pair.erc20_address;
        let coins = Coins::from_coin(coin.clone())?;
        let token_before = self.balance_of(ctx, contract, receiver)?;

        self.bank_keeper.send_coins_from_account_to_module(ctx, sender, ERC20_MODULE_NAME, &coins)?;
        self.bank_keeper.burn_coins(ctx, ERC20_MODULE_NAME, &coins)?;
        let out = self.call_token(ctx, module_address(ERC20_MODULE_NAME), contract, &Erc20::transferCall {
            to: receiver,
            amount: coin.amount,
        })?;
        expect_transfer_success(&out)?;

        self.expect_token_balance(ctx, contract, receiver, token_before.saturating_add(coin.amount))
    }

    /// Module-owned pair, token to coin: burn the tokens and release escrowed coins.
    fn burn_and_unescrow(
        &self,
        ctx: &mut Context,
        pair: &TokenPair,
        sender: Address,
        receiver: Address,
        amount: U256,
    ) -> Result<(), Erc20Error> {
        let contract = pair.erc20_address;
        let coin_before = self.bank_keeper.get_balance(ctx, receiver, &pair.denom).amount;
        let token_before = self.balance_of(ctx, contract, sender)?;
        if token_before < amount {
            return Err(Erc20Error::InsufficientTokenBalance { balance: token_before, required: amount });
        }

        self.call_token(ctx, module_address(ERC20_MODULE_NAME), contract, &Erc20::burnCoinsCall {
            from: sender,
            amount,
        })?;
        let coins = Coins::from_coin(Coin::new(&pair.denom, amount))?;
        self.bank_keeper.send_coins_from_module_to_account(ctx, ERC20_MODULE_NAME, receiver, &coins)?;

        self.expect_coin_balance(ctx, receiver, &pair.denom, coin_before.saturating_add(amount))?;
        self.expect_token_balance(ctx, contract, sender, token_before - amount)
    }

    /// Externally-owned pair, token to coin: escrow the tokens and mint coins.
    fn transfer_and_mint(
        &self,
        ctx: &mut Context,
        pair: &TokenPair,
        sender: Address,
        receiver: Address,
        amount: U256,
    ) -> Result<(), Erc20Error> {
        let contract = pair.erc20_address;
        let module = module_address(ERC20_MODULE_NAME);
        let coin_before = self.bank_keeper.get_balance(ctx, receiver, &pair.denom).amount;
        let escrow_before = self.balance_of(ctx, contract, module)?;

        let out = self.call_token(ctx, sender, contract, &Erc20::transferCall { to: module, amount })?;
        expect_transfer_success(&out)?;
        let coins = Coins::from_coin(Coin::new(&pair.denom, amount))?;
        self.bank_keeper.mint_coins(ctx, ERC20_MODULE_NAME, &coins)?;
        self.bank_keeper.send_coins_from_module_to_account(ctx, ERC20_MODULE_NAME, receiver, &coins)?;

        self.expect_token_balance(ctx, contract, module, escrow_before.saturating_add(amount))?;
        self.expect_coin_balance(ctx, receiver, &pair.denom, coin_before.saturating_add(amount))
    }

    fn call_token<C: SolCall>(
        &self,
        ctx: &mut Context,
        from: Address,
        contract: Address,
        call: &C,
    ) -> Result<Bytes, Erc20Error> {
        Ok(self.evm_keeper.call_evm(ctx, from, contract, call.abi_encode().into(), true)?)
    }

    fn expect_coin_balance(
        &self,
        ctx: &Context,
        holder: Address,
        denom: &str,
        expected: U256,
    ) -> Result<(), Erc20Error> {
        let actual = self.bank_keeper.get_balance(ctx, holder, denom).amount;
        if actual != expected {
            return Err(Erc20Error::BalanceInvariance(format!(
                "invalid coin balance - expected: {expected}{denom}, actual: {actual}{denom}"
            )));
        }
        Ok(())
    }

    fn expect_token_balance(
        &self,
        ctx: &mut Context,
        contract: Address,
        holder: Address,
        expected: U256,
    ) -> Result<(), Erc20Error> {
        let actual = self.balance_of(ctx, contract, holder)?;
        if actual != expected {
            return Err(Erc20Error::BalanceInvariance(format!(
                "invalid token balance - expected: {expected}, actual: {actual}"
            )));
        }
        Ok(())
    }
}

fn expect_transfer_success(out: &[u8]) -> Result<(), Erc20Error> {
    match bool::abi_decode(out) {
        Ok(true) => Ok(()),
        Ok(false) => Err(Erc20Error::EvmCall("failed to execute transfer".to_string())),
        Err(err) => Err(Erc20Error::EvmCall(format!("failed to unpack transfer result: {err}"))),
    }
}
