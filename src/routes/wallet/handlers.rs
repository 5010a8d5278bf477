use super::schemas::{LedgerEntryData, WalletData, WithdrawalRequest};
use super::utils::LedgerStore;
use crate::errors::GenericError;
use crate::schemas::{GenericResponse, RequestMetaData};

use actix_web::web;
use utoipa::TupleUnit;

#[utoipa::path(
    get,
    path = "/wallet",
    tag = "Wallet",
    description = "Returns the caller's wallet balance. The wallet is created with a zero balance on first access.",
    summary = "Wallet Fetch Request",
    responses(
        (status=200, description= "Wallet balance", body= GenericResponse<WalletData>),
        (status=500, description= "Internal Server Error", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "wallet fetch", skip(ledger))]
pub async fn fetch_wallet(
    ledger: web::Data<LedgerStore>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<WalletData>>, GenericError> {
    let wallet = ledger.get_wallet(meta_data.user_id).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched wallet",
        Some(WalletData::from(&wallet)),
    )))
}

#[utoipa::path(
    get,
    path = "/wallet/transactions",
    tag = "Wallet",
    description = "Lists the caller's ledger entries, newest first.",
    summary = "Wallet Transaction List Request",
    responses(
        (status=200, description= "Ledger entries", body= GenericResponse<Vec<LedgerEntryData>>),
        (status=500, description= "Internal Server Error", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "wallet transaction list", skip(ledger))]
pub async fn list_wallet_transactions(
    ledger: web::Data<LedgerStore>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<Vec<LedgerEntryData>>>, GenericError> {
    let entries = ledger.list_transactions(meta_data.user_id).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched wallet transactions",
        Some(entries.into_iter().map(LedgerEntryData::from).collect()),
    )))
}

#[utoipa::path(
    post,
    path = "/wallet/withdraw",
    tag = "Wallet",
    description = "Debits the caller's wallet. Fails without side effects when the balance is too low.",
    summary = "Wallet Withdrawal Request",
    request_body(content = WithdrawalRequest, description = "Request Body"),
    responses(
        (status=200, description= "Wallet after withdrawal", body= GenericResponse<WalletData>),
        (status=400, description= "Invalid Request body", body= GenericResponse<TupleUnit>),
        (status=402, description= "Insufficient wallet balance", body= GenericResponse<TupleUnit>),
        (status=500, description= "Internal Server Error", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "wallet withdrawal", skip(ledger, body))]
pub async fn withdraw_from_wallet(
    body: WithdrawalRequest,
    ledger: web::Data<LedgerStore>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<WalletData>>, GenericError> {
    let wallet = ledger
        .withdraw(meta_data.user_id, body.amount, body.description)
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully withdrew from wallet",
        Some(WalletData::from(&wallet)),
    )))
}
