// Read-only statement guard
//
// Token-level scan for statements that mutate or drop objects. Not a SQL
// parser and not an authorization boundary: warehouse-side grants are the
// real control. Off by default; the Lambda enables it per deployment.

use crate::SnowflakeError;

const DESTRUCTIVE_KEYWORDS: [&str; 5] = ["DROP", "DELETE", "TRUNCATE", "ALTER", "CREATE"];

/// Reject statements containing a destructive keyword as a standalone word.
pub fn check_statement(sql: &str) -> Result<(), SnowflakeError> {
    for token in sql.split(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
        if token.is_empty() {
            continue;
        }
        let upper = token.to_ascii_uppercase();
        if DESTRUCTIVE_KEYWORDS.contains(&upper.as_str()) {
            return Err(SnowflakeError::Rejected(upper));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_statements_pass() {
        assert!(check_statement("SELECT current_version()").is_ok());
        assert!(check_statement("select * from orders where id = 7").is_ok());
    }

    #[test]
    fn destructive_statements_are_rejected() {
        assert!(check_statement("DROP TABLE orders").is_err());
        assert!(check_statement("delete from orders").is_err());
        assert!(check_statement("Truncate Table t").is_err());
    }

    #[test]
    fn keywords_inside_identifiers_do_not_trigger() {
        assert!(check_statement("SELECT created_at, dropped_count FROM audit").is_ok());
        assert!(check_statement("SELECT * FROM deleted_items_view").is_ok());
    }
}
