//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::baas::Baas;
use crate::config::Config;
use crate::ledger::LedgerService;
use crate::missions::MissionService;
use crate::moderation::ModerationGateway;
use crate::notifications::NotificationService;
use crate::payments::{PaymentProvider, PaymentReconciler, PurchaseStatusUpdater};
use crate::raffles::RaffleService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: Arc<AuthService>,
    pub moderation_gateway: Arc<ModerationGateway>,
    pub payment_reconciler: Arc<PaymentReconciler>,
    pub purchase_status: Arc<PurchaseStatusUpdater>,
    pub mission_service: Arc<MissionService>,
    pub raffle_service: Arc<RaffleService>,
    pub notification_service: Arc<NotificationService>,
    pub ledger: Arc<LedgerService>,
}

impl AppState {
    /// Wire every service to one backend and an optional payment provider
    pub fn new(
        config: Config,
        baas: Arc<dyn Baas>,
        payment_provider: Option<Arc<dyn PaymentProvider>>,
    ) -> Self {
        let auth_service = Arc::new(AuthService::new(
            baas.clone(),
            config.supabase_jwt_secret.clone(),
        ));
        let ledger = Arc::new(LedgerService::new(baas.clone()));

        let payment_reconciler = Arc::new(PaymentReconciler::new(
            baas.clone(),
            payment_provider,
            config.mercado_pago_webhook_secret.clone(),
            config.webhook_signature_policy,
        ));

        Self {
            moderation_gateway: Arc::new(ModerationGateway::new(
                baas.clone(),
                auth_service.clone(),
            )),
            purchase_status: Arc::new(PurchaseStatusUpdater::new(baas.clone(), ledger.clone())),
            mission_service: Arc::new(MissionService::new(baas.clone())),
            raffle_service: Arc::new(RaffleService::new(baas.clone())),
            notification_service: Arc::new(NotificationService::new(baas)),
            config: Arc::new(config),
            auth_service,
            payment_reconciler,
            ledger,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for Arc<MissionService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.mission_service.clone()
    }
}

impl FromRef<AppState> for Arc<RaffleService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.raffle_service.clone()
    }
}

impl FromRef<AppState> for Arc<NotificationService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.notification_service.clone()
    }
}

impl FromRef<AppState> for Arc<LedgerService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ledger.clone()
    }
}
