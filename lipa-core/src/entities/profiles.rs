use sqlx::PgExecutor;
use uuid::Uuid;

/// Resolve a user from the phone number the gateway reports.
///
/// The gateway sends `2547XXXXXXXX`; profiles may hold the local `07…` or
/// the `+254…` spelling of the same number. Profiles are owned by the auth
/// platform and only read here.
pub async fn find_user_by_phone<'e>(
    executor: impl PgExecutor<'e>,
    phone: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM profiles WHERE phone = ANY($1) LIMIT 1")
        .bind(phone_spellings(phone))
        .fetch_optional(executor)
        .await
}

fn phone_spellings(phone: &str) -> Vec<String> {
    let mut spellings = vec![phone.to_owned()];
    if let Some(subscriber) = phone.strip_prefix("254") {
        spellings.push(format!("0{subscriber}"));
        spellings.push(format!("+{phone}"));
    }
    spellings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_spellings() {
        assert_eq!(
            phone_spellings("254712345678"),
            vec!["254712345678", "0712345678", "+254712345678"]
        );
        assert_eq!(phone_spellings("0712345678"), vec!["0712345678"]);
    }
}
