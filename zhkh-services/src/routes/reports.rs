/// Report and receipt endpoints
///
/// # Endpoints
///
/// ```text
/// POST /api/reports               generate a monthly report and PDF receipt
/// GET  /api/reports?account=<id>  reports of an account, newest first
/// GET  /api/reports/:id           report metadata
/// GET  /api/reports/:id/receipt   PDF receipt
/// ```
///
/// # Generation
///
/// ```text
/// account ──┐
/// charges of the month ──┼── totals per service ── PDF + QR PNG ── reports row
/// payments ──┘
/// ```

use crate::{
    app::ServiceState,
    receipt::{
        qr_file_name, qr_payload, receipt_file_name, write_qr_image, write_receipt, QrGrid,
        ReceiptData, ReceiptLine, ReceiptPayment,
    },
    summary::{category_totals, CategoryTotal},
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use zhkh_shared::api::{
    envelope::{created, ok},
    ApiError, ApiResult, Envelope, JsonBody, PathParam, QueryParams,
};
use zhkh_shared::models::report::{
    month_bounds, Charge, CreateReport, Report, ReportAccount, ReportPayment, ReportStatus,
};

#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    #[serde(alias = "accountId")]
    pub account_id: Option<i64>,

    /// `YYYYMM`, as a string or a number
    pub period: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ReportListQuery {
    pub account: Option<i64>,
}

/// Payment row of a generated report
#[derive(Debug, Clone, Serialize)]
pub struct ReportPaymentRow {
    pub date: NaiveDate,
    pub amount: f64,
    pub method: String,
}

/// Result of report generation
#[derive(Debug, Serialize)]
pub struct GeneratedReport {
    pub report_id: i64,
    pub account_id: i64,
    pub period: String,
    pub account_number: String,
    pub address: String,
    pub total_amount: f64,
    pub services: Vec<CategoryTotal>,
    pub payments: Vec<ReportPaymentRow>,
    pub receipt_path: String,
    pub qr_path: String,
    pub qr_data: String,
}

/// Billing month parsed from `YYYYMM`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingMonth {
    /// The normalized `YYYYMM` string
    pub code: String,
    pub start: NaiveDate,
    pub next_start: NaiveDate,
}

impl BillingMonth {
    /// `YYYY-MM`, as printed on receipts
    pub fn label(&self) -> String {
        format!("{}-{}", &self.code[..4], &self.code[4..])
    }
}

fn invalid_period() -> ApiError {
    ApiError::invalid_field("period", "Period must be in YYYYMM format")
}

/// Parses a `YYYYMM` period given as a string or a number
pub fn parse_period(raw: &Value) -> ApiResult<BillingMonth> {
    let code = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(invalid_period()),
    };

    if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_period());
    }

    let year: i32 = code[..4].parse().map_err(|_| invalid_period())?;
    let month: u32 = code[4..].parse().map_err(|_| invalid_period())?;

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid_period)?;
    let (start, next_start) = month_bounds(first).ok_or_else(invalid_period)?;

    Ok(BillingMonth {
        code,
        start,
        next_start,
    })
}

/// Generates the report and receipt of one account and month
///
/// # Errors
///
/// - `400 Bad Request`: missing account or malformed period
/// - `404 Not Found`: unknown account, or no charges for the month
/// - `500 Internal Server Error`: receipt or QR image could not be written
pub async fn generate_report(
    State(state): State<ServiceState>,
    JsonBody(req): JsonBody<GenerateReportRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<GeneratedReport>>)> {
    let account_id = req
        .account_id
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::invalid_field("account_id", "Account ID is required"))?;
    let month = parse_period(req.period.as_ref().ok_or_else(invalid_period)?)?;

    let account = ReportAccount::find_by_id(&state.db, account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    let charges = Charge::list_for_period(&state.db, account_id, month.start).await?;
    if charges.is_empty() {
        return Err(ApiError::NotFound(
            "No charges found for the period".to_string(),
        ));
    }

    let (services, total) =
        category_totals(charges.iter().map(|c| (c.service_type.as_str(), c.amount)));

    let payments: Vec<ReportPaymentRow> = ReportPayment::list_for_account(&state.db, account_id)
        .await?
        .into_iter()
        .map(|p| ReportPaymentRow {
            date: p.payment_date,
            amount: p.amount,
            method: p.method,
        })
        .collect();

    let qr_data = qr_payload(account_id, total);
    let qr = QrGrid::encode(&qr_data).map_err(|e| ApiError::InternalError(e.to_string()))?;

    let qr_path = write_qr_image(
        &state.config.qrcodes_dir,
        &qr_file_name(account_id, &month.code),
        &qr,
    )
    .await
    .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let qr_path = qr_path.to_string_lossy().into_owned();

    let receipt = ReceiptData {
        account_number: account.number.clone(),
        address: account.address.clone(),
        area: account.area,
        residents: account.residents,
        management_company: account.management_company.clone(),
        period_label: month.label(),
        charges: services
            .iter()
            .map(|s| ReceiptLine {
                service: s.kind.clone(),
                amount: s.amount,
            })
            .collect(),
        total,
        payments: payments
            .iter()
            .map(|p| ReceiptPayment {
                date: p.date,
                amount: p.amount,
                method: p.method.clone(),
            })
            .collect(),
        qr_payload: qr_data.clone(),
        qr,
    };

    let path = write_receipt(
        &state.config.receipts_dir,
        &receipt_file_name(account_id, &month.code),
        &receipt,
    )
    .await
    .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let receipt_path = path.to_string_lossy().into_owned();

    let services_data = serde_json::to_value(&services)
        .map_err(|e| ApiError::InternalError(format!("Failed to encode services: {}", e)))?;

    let report_id = Report::create(
        &state.db,
        CreateReport {
            account_id,
            period_start: month.start,
            period_end: month.next_start,
            total_amount: total,
            services_data,
            qr_data: qr_data.clone(),
            file_path: receipt_path.clone(),
            status: ReportStatus::Generated,
        },
    )
    .await?;

    info!(
        report_id,
        account_id,
        period = %month.code,
        total,
        "Report generated"
    );

    Ok(created(GeneratedReport {
        report_id,
        account_id,
        period: month.code,
        account_number: account.number,
        address: account.address,
        total_amount: total,
        services,
        payments,
        receipt_path,
        qr_path,
        qr_data,
    }))
}

/// Reports of an account, newest first
pub async fn list_reports(
    State(state): State<ServiceState>,
    QueryParams(query): QueryParams<ReportListQuery>,
) -> ApiResult<Json<Envelope<Vec<Report>>>> {
    let account_id = query
        .account
        .ok_or_else(|| ApiError::BadRequest("Account ID is required".to_string()))?;
    let reports = Report::list_for_account(&state.db, account_id).await?;
    Ok(ok(reports))
}

pub async fn get_report(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Envelope<Report>>> {
    let report = Report::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Report not found".to_string()))?;
    Ok(ok(report))
}

/// Streams the stored PDF receipt
pub async fn download_receipt(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<impl IntoResponse> {
    let report = Report::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Report not found".to_string()))?;

    let bytes = match tokio::fs::read(&report.file_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(report_id = id, path = %report.file_path, "Receipt file missing");
            return Err(ApiError::NotFound("Receipt file not found".to_string()));
        }
        Err(e) => {
            return Err(ApiError::InternalError(format!(
                "Failed to read receipt {}: {}",
                report.file_path, e
            )))
        }
    };

    let file_name = std::path::Path::new(&report.file_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("receipt_{}.pdf", id));

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    ))
}
