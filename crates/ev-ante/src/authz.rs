//! Execution of Ethereum messages on behalf of another account.

use crate::{
    error::AnteError,
    handler::{AnteDecorator, Next},
};
use ev_common::MSG_ETHEREUM_TX_TYPE_URL;
use ev_context::Context;
use ev_keepers::AuthzKeeper;
use ev_primitives::{Msg, Tx};
use std::sync::Arc;

/// Requires a generic grant from the `on_behalf` account to the sender of every message that
/// sets one.
#[derive(Debug, Clone)]
pub struct EthAuthorizationDecorator {
    authz_keeper: Arc<dyn AuthzKeeper>,
}

impl EthAuthorizationDecorator {
    /// Decorator reading grants from `authz_keeper`.
    pub fn new(authz_keeper: Arc<dyn AuthzKeeper>) -> Self {
        Self { authz_keeper }
    }
}

impl AnteDecorator for EthAuthorizationDecorator {
    fn ante_handle(&self, ctx: &mut Context, tx: &Tx, simulate: bool, next: Next<'_>) -> Result<(), AnteError> {
        for msg in &tx.msgs {
            let Msg::Ethereum(eth) = msg else {
                return Err(AnteError::UnknownRequest(format!(
                    "invalid message type {}, expected {MSG_ETHEREUM_TX_TYPE_URL}",
                    msg.type_url()
                )));
            };
            let Some(granter) = eth.on_behalf else { continue };
            let grantee = eth.sender().map_err(|err| AnteError::InvalidAddress(err.to_string()))?;

            let Some(authorization) =
                self.authz_keeper.get_authorization(ctx, grantee, granter, MSG_ETHEREUM_TX_TYPE_URL)
            else {
                return Err(AnteError::Unauthorized(format!(
                    "granter has not granted permission to execute MsgEthereumTx on their behalf or it has been expired: granter {granter}, grantee {grantee}"
                )));
            };
            let Some(generic) = authorization.as_generic() else {
                return Err(AnteError::Logic(format!(
                    "expected generic authorization, got {}",
                    authorization.msg_type_url()
                )));
            };
            if !generic.accept(msg).accept {
                return Err(AnteError::Unauthorized(format!(
                    "granter has not granted permission to execute MsgEthereumTx on their behalf: granter {granter}, grantee {grantee}"
                )));
            }
            tracing::debug!(target: "ev_ante::authz", %granter, %grantee, "authorized execution on behalf");
        }

        next.run(ctx, tx, simulate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{legacy_tx, probe, ALICE, BOB};
    use ev_keepers::memory::MemoryAuthzKeeper;
    use ev_primitives::{Authorization, Coins, GenericAuthorization, Grant, MsgEthereumTx};

    fn on_behalf_tx(on_behalf: Option<alloy_primitives::Address>) -> Tx {
        let mut msg = MsgEthereumTx::new(legacy_tx(1, Some(BOB), 10, 1000, 1)).with_from(ALICE);
        if let Some(granter) = on_behalf {
            msg = msg.with_on_behalf(granter);
        }
        Tx::from_eth(msg)
    }

    fn run(ctx: &mut Context, tx: &Tx) -> (Result<(), AnteError>, bool) {
        let decorator = EthAuthorizationDecorator::new(Arc::new(MemoryAuthzKeeper));
        probe(&decorator, ctx, tx)
    }

    #[test]
    fn messages_without_on_behalf_pass() {
        let mut ctx = Context::default();
        let (result, reached) = run(&mut ctx, &on_behalf_tx(None));
        assert!(result.is_ok());
        assert!(reached);
    }

    #[test]
    fn on_behalf_requires_a_live_generic_grant() {
        let mut ctx = Context::default().with_block_time(1_000);
        let tx = on_behalf_tx(Some(BOB));

        let (result, reached) = run(&mut ctx, &tx);
        assert!(matches!(result, Err(AnteError::Unauthorized(_))));
        assert!(!reached);

        let grant = Grant {
            authorization: Authorization::Generic(GenericAuthorization::new(MSG_ETHEREUM_TX_TYPE_URL)),
            expiration: Some(999),
        };
        MemoryAuthzKeeper.save_grant(&mut ctx, BOB, ALICE, &grant).expect("grant");
        assert!(matches!(run(&mut ctx, &tx).0, Err(AnteError::Unauthorized(_))));

        let grant = Grant { expiration: None, ..grant };
        MemoryAuthzKeeper.save_grant(&mut ctx, BOB, ALICE, &grant).expect("grant");
        let (result, reached) = run(&mut ctx, &tx);
        assert!(result.is_ok());
        assert!(reached);
    }

    #[test]
    fn typed_grants_are_a_logic_error() {
        let mut ctx = Context::default();
        let grant = Grant { authorization: Authorization::Send { spend_limit: Coins::empty() }, expiration: None };
        MemoryAuthzKeeper
            .save_grant_for(&mut ctx, BOB, ALICE, MSG_ETHEREUM_TX_TYPE_URL, &grant)
            .expect("grant");

        let (result, reached) = run(&mut ctx, &on_behalf_tx(Some(BOB)));
        assert_eq!(result.expect_err("typed grant").kind(), ev_common::ErrorKind::LogicError);
        assert!(!reached);
    }

    #[test]
    fn non_ethereum_messages_are_unknown_requests() {
        let mut ctx = Context::default();
        let tx = Tx::new(vec![Msg::Other { type_url: "/cosmos.bank.v1beta1.MsgSend".into() }]);
        let (result, reached) = run(&mut ctx, &tx);
        assert!(matches!(result, Err(AnteError::UnknownRequest(_))));
        assert!(!reached);
    }
}
