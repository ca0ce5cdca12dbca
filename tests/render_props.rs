//! Property-based tests for statement rendering
//!
//! These tests verify the renderer's contracts over arbitrary clause
//! combinations:
//! - Rendering is deterministic and idempotent
//! - Clause fragments appear in a fixed order, or not at all
//! - The limit is a literal, never a placeholder
//! - Placeholder counts match the values that will be bound

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use activerow::statement;
    use activerow::{BatchStyle, Value};

    fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,12}".prop_map(|s: String| s)
    }

    fn arb_condition() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9_]{0,8}", prop_oneof![Just("="), Just(">"), Just("<")])
            .prop_map(|(col, op)| format!("{col} {op} ?"))
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i32>().prop_map(Value::Int),
            any::<i64>().prop_map(Value::Long),
            any::<bool>().prop_map(Value::Bool),
            any::<f64>().prop_map(Value::Double),
            "[a-zA-Z0-9 ']{0,16}".prop_map(Value::Text),
            Just(Value::Null),
        ]
    }

    proptest! {
        #[test]
        fn select_rendering_is_idempotent(
            table in arb_identifier(),
            select in proptest::option::of(arb_identifier()),
            where_clause in proptest::option::of(arb_condition()),
            group_by in proptest::option::of(arb_identifier()),
            order_by in proptest::option::of(arb_identifier()),
            limit in proptest::option::of(0u32..1000),
        ) {
            let render = || statement::select(
                &table,
                select.as_deref(),
                where_clause.as_deref(),
                group_by.as_deref(),
                order_by.as_deref(),
                limit,
            );
            prop_assert_eq!(render(), render());
        }

        #[test]
        fn select_clause_order_is_fixed(
            table in arb_identifier(),
            where_clause in proptest::option::of(arb_condition()),
            group_by in proptest::option::of(arb_identifier()),
            order_by in proptest::option::of(arb_identifier()),
            limit in proptest::option::of(0u32..1000),
        ) {
            let sql = statement::select(
                &table,
                None,
                where_clause.as_deref(),
                group_by.as_deref(),
                order_by.as_deref(),
                limit,
            );

            let prefix = format!("SELECT * FROM {}", table);
            prop_assert!(sql.starts_with(&prefix));
            prop_assert_eq!(sql.contains(" WHERE "), where_clause.is_some());
            prop_assert_eq!(sql.contains(" GROUP BY "), group_by.is_some());
            prop_assert_eq!(sql.contains(" ORDER BY "), order_by.is_some());
            prop_assert_eq!(sql.contains(" LIMIT "), limit.is_some());

            let positions: Vec<usize> = [" WHERE ", " GROUP BY ", " ORDER BY ", " LIMIT "]
                .iter()
                .filter_map(|fragment| sql.find(fragment))
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn limit_is_always_a_literal(
            table in arb_identifier(),
            limit in 0u32..10000,
        ) {
            let sql = statement::select(&table, None, None, None, None, Some(limit));
            let suffix = format!(" LIMIT {}", limit);
            prop_assert!(sql.ends_with(&suffix));
            prop_assert!(!sql.contains('?'));
        }

        #[test]
        fn update_has_one_placeholder_per_column(
            table in arb_identifier(),
            columns in proptest::collection::vec(arb_identifier(), 1..6),
        ) {
            let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
            let sql = statement::update(&table, &refs, None);
            prop_assert_eq!(sql.matches('?').count(), columns.len());
            for column in &columns {
                let fragment = format!("{}=?", column);
                prop_assert!(sql.contains(&fragment));
            }
        }

        #[test]
        fn insert_has_one_placeholder_per_column(
            table in arb_identifier(),
            columns in proptest::collection::vec(arb_identifier(), 1..6),
        ) {
            let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
            let sql = statement::insert(&table, &refs);
            prop_assert_eq!(sql.matches('?').count(), columns.len());
        }

        #[test]
        fn batch_parameterized_binds_every_value(
            table in arb_identifier(),
            rows in proptest::collection::vec(
                proptest::collection::vec(arb_value(), 3..=3), 1..5),
        ) {
            let (sql, params) = statement::batch_insert(
                &table, &["a", "b", "c"], &rows, BatchStyle::Parameterized);
            prop_assert_eq!(params.len(), rows.len() * 3);
            prop_assert_eq!(sql.matches('?').count(), rows.len() * 3);
        }

        #[test]
        fn batch_inlined_binds_only_text(
            table in arb_identifier(),
            rows in proptest::collection::vec(
                proptest::collection::vec(arb_value(), 3..=3), 1..5),
        ) {
            let text_count = rows
                .iter()
                .flatten()
                .filter(|v| matches!(v, Value::Text(_)))
                .count();
            let (sql, params) = statement::batch_insert(
                &table, &["a", "b", "c"], &rows, BatchStyle::InlineLiterals);
            prop_assert_eq!(params.len(), text_count);
            prop_assert_eq!(sql.matches('?').count(), text_count);
            prop_assert!(params.iter().all(|v| matches!(v, Value::Text(_))));
        }
    }
}
