use crate::kraken::types::PaymentRequestsData;
use crate::model::PaymentRequest;

/// Latest payment request of a ledger; the query already asks for one
pub fn extract_payment_request(
    ledger_number: &str,
    data: &PaymentRequestsData,
) -> Option<PaymentRequest> {
    let node = data
        .payment_requests
        .as_ref()?
        .payment_request
        .as_ref()?
        .nodes()
        .next()?;

    Some(PaymentRequest {
        ledger_number: ledger_number.to_string(),
        status: node.payment_status.clone(),
        total_amount_cents: node.total_amount,
        customer_amount_cents: node.customer_amount,
        expected_payment_date: node.expected_payment_date.clone(),
    })
}
