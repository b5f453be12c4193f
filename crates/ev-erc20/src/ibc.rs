//! ICS-20 callbacks and the middleware that installs them around a transfer application.
//!
//! Received vouchers with a registered, enabled token pair are converted to ERC20 right away:
//! the recipient's whole balance of the voucher denomination is converted, including coins
//! that were already there before the packet arrived. Refunds from failed or timed out
//! transfers are converted back the same way.

use crate::{error::Erc20Error, keeper::Keeper};
use alloy_primitives::Address;
use ev_common::address_from_bech32;
use ev_context::{Context, KvGasConfig};
use ev_primitives::{
    ibc::{received_coin, sent_coin},
    Acknowledgement, FungibleTokenPacketData, Packet,
};
use std::fmt::Debug;

/// Callbacks of an IBC application for packets it sent or received.
pub trait IbcModule: Send + Sync + Debug {
    /// Handles a received packet. Failures are reported through an error acknowledgement.
    fn on_recv_packet(&self, ctx: &mut Context, packet: &Packet, relayer: Address) -> Acknowledgement;

    /// Handles the acknowledgement written by the counterparty for a packet sent from here.
    fn on_acknowledgement_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        acknowledgement: &[u8],
        relayer: Address,
    ) -> Result<(), Erc20Error>;

    /// Handles a packet sent from here that timed out.
    fn on_timeout_packet(&self, ctx: &mut Context, packet: &Packet, relayer: Address) -> Result<(), Erc20Error>;
}

impl Keeper {
    /// Converts received vouchers into ERC20 tokens. Returns `ack` unchanged when no
    /// conversion applies and an error acknowledgement when the conversion fails.
    ///
    /// Store access is not charged.
    pub fn on_recv_packet(&self, ctx: &mut Context, packet: &Packet, ack: Acknowledgement) -> Acknowledgement {
        let data = match FungibleTokenPacketData::from_bytes(&packet.data) {
            Ok(data) => data,
            Err(err) => return Acknowledgement::error(Erc20Error::UnknownRequest(err.to_string())),
        };
        ctx.with_kv_gas_scope(KvGasConfig::zero(), |ctx| match self.convert_received(ctx, packet, &data) {
            Ok(()) => ack,
            Err(err) => Acknowledgement::error(err),
        })
    }

    fn convert_received(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        data: &FungibleTokenPacketData,
    ) -> Result<(), Erc20Error> {
        if !self.is_erc20_enabled(ctx)? {
            return Ok(());
        }

        let sender = address_from_bech32(&data.sender)?;
        let recipient = address_from_bech32(&data.receiver)?;
        if self.is_module_account(ctx, sender) {
            tracing::debug!(target: "ev_erc20::ibc", %sender, "skipping conversion for module account sender");
            return Ok(());
        }

        let coin = received_coin(
            &packet.source_port,
            &packet.source_channel,
            &packet.destination_port,
            &packet.destination_channel,
            &data.denom,
            data.amount()?,
        );
        if coin.denom == self.evm_keeper.params(ctx).evm_denom {
            return Ok(());
        }

        let Some(pair) = self.find_token_pair(ctx, &coin.denom)? else {
            tracing::error!(target: "ev_erc20::ibc", denom = %coin.denom, "token pair not found");
            return Err(Erc20Error::TokenPairNotFound(format!("coin denom: {}", coin.denom)));
        };
        if !pair.enabled {
            tracing::debug!(target: "ev_erc20::ibc", denom = %coin.denom, "token pair disabled, passing through");
            return Ok(());
        }

        let balance = self.bank_keeper.get_balance(ctx, recipient, &coin.denom);
        self.convert_coin(ctx, &balance, recipient, recipient).inspect_err(|err| {
            tracing::error!(target: "ev_erc20::ibc", coin = %balance, %err, "failed to convert coin to erc20");
        })
    }

    /// Converts the refund of a failed transfer back into ERC20 tokens.
    pub fn on_acknowledgement_packet(
        &self,
        ctx: &mut Context,
        _packet: &Packet,
        data: &FungibleTokenPacketData,
        ack: &Acknowledgement,
    ) -> Result<(), Erc20Error> {
        if ack.is_success() {
            return Ok(());
        }
        self.convert_coin_to_erc20_from_packet(ctx, data)
    }

    /// Converts the refund of a timed out transfer back into ERC20 tokens.
    pub fn on_timeout_packet(
        &self,
        ctx: &mut Context,
        _packet: &Packet,
        data: &FungibleTokenPacketData,
    ) -> Result<(), Erc20Error> {
        self.convert_coin_to_erc20_from_packet(ctx, data)
    }

    /// Converts the refunded amount of `data` for its sender, unless the sender is a module
    /// account, the coin is the bond denomination, or the coin has no enabled pair.
    pub fn convert_coin_to_erc20_from_packet(
        &self,
        ctx: &mut Context,
        data: &FungibleTokenPacketData,
    ) -> Result<(), Erc20Error> {
        let sender = address_from_bech32(&data.sender)?;
        ctx.with_kv_gas_scope(KvGasConfig::zero(), |ctx| {
            if self.is_module_account(ctx, sender) {
                return Ok(());
            }

            let coin = sent_coin(&data.denom, data.amount()?);
            if coin.denom == self.staking_keeper.bond_denom(ctx) {
                return Ok(());
            }

            if !self.is_erc20_enabled(ctx)? {
                return Ok(());
            }
            match self.find_token_pair(ctx, &coin.denom)? {
                Some(pair) if pair.enabled => {}
                _ => return Ok(()),
            }

            self.convert_coin(ctx, &coin, sender, sender)
        })
    }

    fn is_module_account(&self, ctx: &Context, address: Address) -> bool {
        self.account_keeper.get_account(ctx, address).is_some_and(|account| account.is_module_account())
    }
}

/// Wraps a transfer application with the erc20 callbacks.
///
/// On receive, the application and the conversion run on one branch that is committed only
/// when the final acknowledgement is a success.
#[derive(Debug, Clone)]
pub struct Erc20IbcMiddleware<M> {
    app: M,
    keeper: Keeper,
}

impl<M> Erc20IbcMiddleware<M> {
    /// Wraps `app`.
    pub const fn new(app: M, keeper: Keeper) -> Self {
        Self { app, keeper }
    }

    /// The wrapped application.
    pub const fn app(&self) -> &M {
        &self.app
    }
}

fn decode_packet_data(packet: &Packet) -> Result<FungibleTokenPacketData, Erc20Error> {
    FungibleTokenPacketData::from_bytes(&packet.data).map_err(|err| {
        tracing::error!(target: "ev_erc20::ibc", sequence = packet.sequence, %err, "malformed packet data");
        Erc20Error::UnknownRequest(err.to_string())
    })
}

impl<M: IbcModule> IbcModule for Erc20IbcMiddleware<M> {
    fn on_recv_packet(&self, ctx: &mut Context, packet: &Packet, relayer: Address) -> Acknowledgement {
        let mut cache = ctx.branch();
        let ack = self.app.on_recv_packet(&mut cache, packet, relayer);
        if !ack.is_success() {
            return ack;
        }

        let ack = self.keeper.on_recv_packet(&mut cache, packet, ack);
        if ack.is_success() {
            if let Err(err) = ctx.commit(cache) {
                return Acknowledgement::error(err);
            }
        }
        ack
    }

    fn on_acknowledgement_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        acknowledgement: &[u8],
        relayer: Address,
    ) -> Result<(), Erc20Error> {
        let ack = Acknowledgement::from_bytes(acknowledgement).map_err(|err| {
            tracing::error!(target: "ev_erc20::ibc", sequence = packet.sequence, %err, "malformed acknowledgement");
            Erc20Error::UnknownRequest(err.to_string())
        })?;
        let data = decode_packet_data(packet)?;

        self.app.on_acknowledgement_packet(ctx, packet, acknowledgement, relayer)?;
        self.keeper.on_acknowledgement_packet(ctx, packet, &data, &ack)
    }

    fn on_timeout_packet(&self, ctx: &mut Context, packet: &Packet, relayer: Address) -> Result<(), Erc20Error> {
        let data = decode_packet_data(packet)?;
        self.app.on_timeout_packet(ctx, packet, relayer)?;
        self.keeper.on_timeout_packet(ctx, packet, &data)
    }
}

/// Minimal transfer application: mints vouchers on receive and refunds the sender on
/// failure, without escrow accounting.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, Default)]
pub struct MockTransferApp {
    bank: ev_keepers::memory::MemoryBankKeeper,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockTransferApp {
    /// Application crediting vouchers through `bank`.
    pub const fn new(bank: ev_keepers::memory::MemoryBankKeeper) -> Self {
        Self { bank }
    }

    fn refund(&self, ctx: &mut Context, packet: &Packet) -> Result<(), Erc20Error> {
        let data = decode_packet_data(packet)?;
        let sender = address_from_bech32(&data.sender)?;
        let coins = ev_primitives::Coins::from_coin(sent_coin(&data.denom, data.amount()?))?;
        Ok(self.bank.fund(ctx, sender, &coins)?)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl IbcModule for MockTransferApp {
    fn on_recv_packet(&self, ctx: &mut Context, packet: &Packet, _relayer: Address) -> Acknowledgement {
        let credit = |ctx: &mut Context| -> Result<(), Erc20Error> {
            let data = decode_packet_data(packet)?;
            let receiver = address_from_bech32(&data.receiver)?;
            let coin = received_coin(
                &packet.source_port,
                &packet.source_channel,
                &packet.destination_port,
                &packet.destination_channel,
                &data.denom,
                data.amount()?,
            );
            Ok(self.bank.fund(ctx, receiver, &ev_primitives::Coins::from_coin(coin)?)?)
        };
        match credit(ctx) {
            Ok(()) => Acknowledgement::success(),
            Err(err) => Acknowledgement::error(err),
        }
    }

    fn on_acknowledgement_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        acknowledgement: &[u8],
        _relayer: Address,
    ) -> Result<(), Erc20Error> {
        let ack = Acknowledgement::from_bytes(acknowledgement)?;
        if ack.is_success() {
            return Ok(());
        }
        self.refund(ctx, packet)
    }

    fn on_timeout_packet(&self, ctx: &mut Context, packet: &Packet, _relayer: Address) -> Result<(), Erc20Error> {
        self.refund(ctx, packet)
    }
}
