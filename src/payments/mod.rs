//! Payment domain module
//!
//! Mercado Pago client, the reconciliation webhook and the purchase status
//! function it delegates to.

pub mod mercado_pago;
mod model;
mod service;
mod status;

pub use mercado_pago::{MercadoPagoClient, PaymentProvider, ProviderError, ProviderPayment};
pub use model::*;
pub use service::{PaymentReconciler, WebhookError};
pub use status::{parse_target_status, PurchaseError, PurchaseStatusUpdater};
