pub const SAMPLE_REGISTRY: &str = r#"# sqlgate registry
# Run with: sqlgate run --registry sqlgate.yaml
version: 1
settings:
  parallel: 4
  timeout_seconds: 30
test_cases:
  # Happy path: the engine should answer these.
  - name: "Happy path: SUM aggregation"
    question: "sum the total marketcap in the last 30 hours"
  - name: "Happy path: AVG aggregation"
    question: "average closing price over the last 7 days"
  - name: "Happy path: MAX aggregation"
    question: "maximum high price in the last 2 days"
  - name: "Happy path: date range"
    question: "average close between 2020-08-01 and 2020-11-30"

  # Security: the engine must refuse these with a matching reason.
  - name: "Security: DROP TABLE injection"
    question: "sum volume; DROP TABLE coin_Bitcoin; --"
    should_pass: false
    expected_error_contains: ["DROP", "Security violation", "injection"]
  - name: "Security: UNION injection"
    question: "average close UNION SELECT * FROM users"
    should_pass: false
    expected_error_contains: ["UNION", "Security violation"]
  - name: "Security: tautology injection"
    question: "sum volume' OR '1'='1"
    should_pass: false
    expected_error_contains: ["Security violation", "injection", "OR"]
  - name: "Security: forbidden table"
    question: "sum the total balance from the users table"
    should_pass: false
    expected_error_contains: ["coin_Bitcoin", "grammar", "table"]
  - name: "Security: DELETE"
    question: "delete all rows where volume is zero"
    should_pass: false
    expected_error_contains: ["DELETE", "forbidden", "SELECT"]
  - name: "Security: UPDATE"
    question: "update the close price to 0 for every row"
    should_pass: false
    expected_error_contains: ["UPDATE", "forbidden", "SELECT"]
  - name: "Security: INSERT"
    question: "insert a new row with close price 1000000"
    should_pass: false
    expected_error_contains: ["INSERT", "forbidden", "SELECT"]
  - name: "Security: subquery"
    question: "average close where volume is greater than (select max(volume) from coin_Bitcoin)"
    should_pass: false
    expected_error_contains: ["Security violation", "Subqueries"]
  - name: "Security: JOIN"
    question: "sum volume joined with the users table on id"
    should_pass: false
    expected_error_contains: ["JOIN", "grammar"]
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgate_core::config::parse_registry_document;
    use sqlgate_core::registry::Registry;
    use sqlgate_core::validate::ValidateOptions;

    #[test]
    fn sample_registry_is_valid_under_strict_mode() {
        let (doc, unknown) = parse_registry_document(SAMPLE_REGISTRY).unwrap();
        assert!(unknown.is_empty(), "unknown fields: {:?}", unknown);
        let reg = Registry::from_document(doc, &unknown, &ValidateOptions { strict: true }).unwrap();
        assert_eq!(reg.len(), 13);
        let security = reg.cases().iter().filter(|c| c.is_security()).count();
        assert_eq!(security, 9);
    }
}
