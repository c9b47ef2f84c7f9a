use lipa_sdk::objects::mpesa::{StkCallback, MetadataItem};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// What the gateway reported for one push prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Paid(PaymentConfirmation),
    /// Cancelled by the customer, timed out on the handset, insufficient
    /// funds and so on.
    Failed {
        checkout_request_id: String,
        result_code: i64,
        result_desc: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub checkout_request_id: String,
    pub merchant_request_id: Option<String>,
    pub amount: Decimal,
    /// Digits only, as reported by the gateway (`2547XXXXXXXX`).
    pub phone: String,
    pub receipt_number: Option<String>,
    pub result_desc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    #[error("callback metadata is missing {0}")]
    MissingField(&'static str),
    #[error("callback metadata field {0} is malformed")]
    Malformed(&'static str),
}

impl CallbackOutcome {
    pub fn checkout_request_id(&self) -> &str {
        match self {
            CallbackOutcome::Paid(confirmation) => &confirmation.checkout_request_id,
            CallbackOutcome::Failed {
                checkout_request_id,
                ..
            } => checkout_request_id,
        }
    }

    /// Interpret a callback. Only a successful result needs metadata.
    pub fn from_callback(callback: StkCallback) -> Result<Self, CallbackError> {
        if callback.result_code != 0 {
            return Ok(CallbackOutcome::Failed {
                checkout_request_id: callback.checkout_request_id,
                result_code: callback.result_code,
                result_desc: callback.result_desc,
            });
        }

        let items = callback
            .callback_metadata
            .map(|metadata| metadata.item)
            .unwrap_or_default();

        let amount = find(&items, "Amount")
            .ok_or(CallbackError::MissingField("Amount"))
            .and_then(|value| decimal(value).ok_or(CallbackError::Malformed("Amount")))?;
        let phone = find(&items, "PhoneNumber")
            .ok_or(CallbackError::MissingField("PhoneNumber"))
            .and_then(|value| digits(value).ok_or(CallbackError::Malformed("PhoneNumber")))?;
        let receipt_number = find(&items, "MpesaReceiptNumber").and_then(text);

        Ok(CallbackOutcome::Paid(PaymentConfirmation {
            checkout_request_id: callback.checkout_request_id,
            merchant_request_id: callback.merchant_request_id,
            amount,
            phone,
            receipt_number,
            result_desc: callback.result_desc,
        }))
    }
}

fn find<'a>(items: &'a [MetadataItem], name: &str) -> Option<&'a Value> {
    items
        .iter()
        .find(|item| item.name == name)
        .and_then(|item| item.value.as_ref())
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .or_else(|_| Decimal::from_scientific(&number.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn digits(value: &Value) -> Option<String> {
    let raw = match value {
        Value::Number(number) => number.to_string(),
        Value::String(s) => s.trim().trim_start_matches('+').to_owned(),
        _ => return None,
    };
    (!raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())).then_some(raw)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lipa_sdk::objects::mpesa::CallbackEnvelope;

    fn parse(json: &str) -> Result<CallbackOutcome, CallbackError> {
        let envelope: CallbackEnvelope = serde_json::from_str(json).unwrap();
        CallbackOutcome::from_callback(envelope.body.stk_callback)
    }

    #[test]
    fn test_successful_callback_extracts_metadata() {
        let outcome = parse(
            r#"{"Body":{"stkCallback":{
                "MerchantRequestID":"29115-34620561-1",
                "CheckoutRequestID":"ws_CO_191220191020363925",
                "ResultCode":0,
                "ResultDesc":"The service request is processed successfully.",
                "CallbackMetadata":{"Item":[
                    {"Name":"Amount","Value":1.00},
                    {"Name":"MpesaReceiptNumber","Value":"NLJ7RT61SV"},
                    {"Name":"Balance"},
                    {"Name":"TransactionDate","Value":20191219102115},
                    {"Name":"PhoneNumber","Value":254708374149}
                ]}
            }}}"#,
        )
        .unwrap();

        let CallbackOutcome::Paid(confirmation) = outcome else {
            panic!("expected a paid outcome");
        };
        assert_eq!(confirmation.checkout_request_id, "ws_CO_191220191020363925");
        assert_eq!(confirmation.amount, Decimal::ONE);
        assert_eq!(confirmation.phone, "254708374149");
        assert_eq!(confirmation.receipt_number.as_deref(), Some("NLJ7RT61SV"));
    }

    #[test]
    fn test_failed_callback_needs_no_metadata() {
        let outcome = parse(
            r#"{"Body":{"stkCallback":{
                "MerchantRequestID":"29115-34620561-1",
                "CheckoutRequestID":"ws_CO_1",
                "ResultCode":1032,
                "ResultDesc":"Request cancelled by user"
            }}}"#,
        )
        .unwrap();

        assert_eq!(
            outcome,
            CallbackOutcome::Failed {
                checkout_request_id: "ws_CO_1".into(),
                result_code: 1032,
                result_desc: Some("Request cancelled by user".into()),
            }
        );
        assert_eq!(outcome.checkout_request_id(), "ws_CO_1");
    }

    #[test]
    fn test_successful_callback_without_amount_is_rejected() {
        let err = parse(
            r#"{"Body":{"stkCallback":{
                "CheckoutRequestID":"ws_CO_2",
                "ResultCode":0,
                "CallbackMetadata":{"Item":[{"Name":"PhoneNumber","Value":254708374149}]}
            }}}"#,
        )
        .unwrap_err();
        assert_eq!(err, CallbackError::MissingField("Amount"));
    }

    #[test]
    fn test_successful_callback_without_metadata_is_rejected() {
        let err = parse(r#"{"Body":{"stkCallback":{"CheckoutRequestID":"ws_CO_3","ResultCode":0}}}"#)
            .unwrap_err();
        assert_eq!(err, CallbackError::MissingField("Amount"));
    }

    #[test]
    fn test_string_values_are_accepted() {
        let outcome = parse(
            r#"{"Body":{"stkCallback":{
                "CheckoutRequestID":"ws_CO_4",
                "ResultCode":0,
                "CallbackMetadata":{"Item":[
                    {"Name":"Amount","Value":"250"},
                    {"Name":"PhoneNumber","Value":"+254712345678"}
                ]}
            }}}"#,
        )
        .unwrap();
        let CallbackOutcome::Paid(confirmation) = outcome else {
            panic!("expected a paid outcome");
        };
        assert_eq!(confirmation.amount, Decimal::new(250, 0));
        assert_eq!(confirmation.phone, "254712345678");
        assert_eq!(confirmation.receipt_number, None);
    }
}
