use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentProofRequest {
    pub payment_proof_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectPaymentRequest {
    pub reason: String,
}
