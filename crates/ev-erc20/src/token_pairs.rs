use crate::{
    error::Erc20Error, keeper::Keeper, EVENT_TYPE_REGISTER_PAIR, EVENT_TYPE_TOGGLE_CONVERSION,
};
use alloy_primitives::{Address, B256};
use ev_context::{Context, Event};
use ev_primitives::TokenPair;

const PAIR_PREFIX: &str = "erc20/pair/";

fn pair_key(id: B256) -> String {
    format!("{PAIR_PREFIX}{id}")
}

fn denom_key(denom: &str) -> String {
    format!("erc20/denom/{denom}")
}

fn contract_key(contract: Address) -> String {
    format!("erc20/contract/{contract}")
}

impl Keeper {
    /// Id of the pair registered for `token`, which is either a hex contract address or a
    /// coin denomination.
    pub fn token_pair_id(&self, ctx: &Context, token: &str) -> Result<Option<B256>, Erc20Error> {
        let key = match token.parse::<Address>() {
            Ok(contract) if token.starts_with("0x") => contract_key(contract),
            _ => denom_key(token),
        };
        Ok(ctx.get_json(key.as_bytes())?)
    }

    /// Pair stored under `id`.
    pub fn token_pair(&self, ctx: &Context, id: B256) -> Result<Option<TokenPair>, Erc20Error> {
        Ok(ctx.get_json(pair_key(id).as_bytes())?)
    }

    /// Pair registered for `token`, if any.
    pub fn find_token_pair(&self, ctx: &Context, token: &str) -> Result<Option<TokenPair>, Erc20Error> {
        match self.token_pair_id(ctx, token)? {
            Some(id) => self.token_pair(ctx, id),
            None => Ok(None),
        }
    }

    /// Resolves `token` to its pair.
    pub fn token_pair_for(&self, ctx: &Context, token: &str) -> Result<TokenPair, Erc20Error> {
        self.find_token_pair(ctx, token)?.ok_or_else(|| Erc20Error::TokenPairNotFound(token.to_string()))
    }

    /// Every registered pair, ordered by id.
    pub fn token_pairs(&self, ctx: &Context) -> Result<Vec<TokenPair>, Erc20Error> {
        Ok(ctx.prefix_json(PAIR_PREFIX.as_bytes())?)
    }

    /// Whether a pair exists for the denomination.
    pub fn is_denom_registered(&self, ctx: &Context, denom: &str) -> bool {
        ctx.has(denom_key(denom).as_bytes())
    }

    /// Whether a pair exists for the contract.
    pub fn is_erc20_registered(&self, ctx: &Context, contract: Address) -> bool {
        ctx.has(contract_key(contract).as_bytes())
    }

    /// Registers a new pair. A denomination and a contract can each belong to one pair only.
    pub fn register_token_pair(&self, ctx: &mut Context, pair: TokenPair) -> Result<(), Erc20Error> {
        pair.validate()?;
        if self.is_denom_registered(ctx, &pair.denom) {
            return Err(Erc20Error::TokenPairAlreadyExists(pair.denom));
        }
        if self.is_erc20_registered(ctx, pair.erc20_address) {
            return Err(Erc20Error::TokenPairAlreadyExists(pair.erc20_address.to_string()));
        }
        self.store_token_pair(ctx, &pair)?;
        ctx.emit_event(
            Event::new(EVENT_TYPE_REGISTER_PAIR)
                .attr("cosmos_coin", &pair.denom)
                .attr("erc20_token", pair.erc20_address),
        );
        tracing::info!(target: "ev_erc20", denom = %pair.denom, erc20 = %pair.erc20_address, "registered token pair");
        Ok(())
    }

    /// Flips the `enabled` flag of the pair resolved from `token`.
    pub fn toggle_conversion(&self, ctx: &mut Context, token: &str) -> Result<TokenPair, Erc20Error> {
        let mut pair = self.token_pair_for(ctx, token)?;
        pair.enabled = !pair.enabled;
        ctx.set_json(pair_key(pair.id()), &pair)?;
        ctx.emit_event(
            Event::new(EVENT_TYPE_TOGGLE_CONVERSION)
                .attr("cosmos_coin", &pair.denom)
                .attr("erc20_token", pair.erc20_address),
        );
        tracing::info!(target: "ev_erc20", denom = %pair.denom, enabled = pair.enabled, "toggled token conversion");
        Ok(pair)
    }

    /// Checks that `token` may be converted towards `receiver` and returns its pair.
    pub fn minting_enabled(
        &self,
        ctx: &Context,
        _sender: Address,
        receiver: Address,
        token: &str,
    ) -> Result<TokenPair, Erc20Error> {
        if !self.is_erc20_enabled(ctx)? {
            return Err(Erc20Error::ModuleDisabled);
        }
        let pair = self.token_pair_for(ctx, token)?;
        if !pair.enabled {
            return Err(Erc20Error::TokenPairDisabled(token.to_string()));
        }
        if self.bank_keeper.is_blocked_address(receiver) {
            return Err(Erc20Error::BlockedAddress(receiver));
        }
        Ok(pair)
    }

    /// Writes a pair and both of its indexes without uniqueness checks.
    pub(crate) fn store_token_pair(&self, ctx: &mut Context, pair: &TokenPair) -> Result<(), Erc20Error> {
        let id = pair.id();
        ctx.set_json(pair_key(id), pair)?;
        ctx.set_json(denom_key(&pair.denom), &id)?;
        ctx.set_json(contract_key(pair.erc20_address), &id)?;
        Ok(())
    }
}
