// ABOUTME: Column-level comparison of source and destination schemas
// ABOUTME: Produces the mismatch report that blocks incompatible transfers

use super::schema::ColumnDescriptor;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;

/// Human-readable problems, one per offending or extra column
pub type MismatchReport = Vec<String>;

/// Compare two column lists by name
///
/// Source-side problems come first in source order, followed by extra
/// destination columns in destination order. Only the data type and the
/// maximum length are compared; precision and scale are ignored.
pub fn diff(source: &[ColumnDescriptor], dest: &[ColumnDescriptor]) -> MismatchReport {
    let dest_by_name: HashMap<&str, &ColumnDescriptor> =
        dest.iter().map(|c| (c.name.as_str(), c)).collect();
    let source_names: HashSet<&str> = source.iter().map(|c| c.name.as_str()).collect();

    let mut errors = Vec::new();

    for column in source {
        match dest_by_name.get(column.name.as_str()) {
            None => errors.push(format!(
                "{}: Column not found in destination database",
                column.name
            )),
            Some(dest_column)
                if dest_column.data_type != column.data_type
                    || dest_column.max_length != column.max_length =>
            {
                errors.push(format!(
                    "{}: Data type mismatch {} {} != {} {}",
                    column.name,
                    or_null(&dest_column.data_type),
                    or_null(&dest_column.max_length),
                    or_null(&column.data_type),
                    or_null(&column.max_length),
                ));
            }
            Some(_) => {}
        }
    }

    for column in dest {
        if !source_names.contains(column.name.as_str()) {
            errors.push(format!(
                "Extra column found in destination database: {}",
                column.name
            ));
        }
    }

    errors
}

fn or_null<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("id", "int").not_null(),
            ColumnDescriptor::new("customer", "nvarchar").with_max_length(100),
            ColumnDescriptor::new("notes", "nvarchar").with_max_length(-1),
            ColumnDescriptor::new("total", "decimal").with_precision(18, 2),
        ]
    }

    #[test]
    fn test_identical_schemas_have_no_errors() {
        assert!(diff(&orders(), &orders()).is_empty());
        assert!(diff(&[], &[]).is_empty());
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let mut shuffled = orders();
        shuffled.reverse();
        assert!(diff(&orders(), &shuffled).is_empty());
        assert!(diff(&shuffled, &orders()).is_empty());
    }

    #[test]
    fn test_missing_and_extra_columns() {
        let source = orders();
        let mut dest = orders();
        dest.retain(|c| c.name != "notes");
        dest.push(ColumnDescriptor::new("legacy_flag", "bit"));

        assert_eq!(
            diff(&source, &dest),
            vec![
                "notes: Column not found in destination database".to_string(),
                "Extra column found in destination database: legacy_flag".to_string(),
            ]
        );
    }

    #[test]
    fn test_type_and_length_mismatch() {
        let source = orders();
        let mut dest = orders();
        dest[0] = ColumnDescriptor::new("id", "bigint").not_null();
        dest[1] = ColumnDescriptor::new("customer", "nvarchar").with_max_length(50);

        assert_eq!(
            diff(&source, &dest),
            vec![
                "id: Data type mismatch bigint null != int null".to_string(),
                "customer: Data type mismatch nvarchar 50 != nvarchar 100".to_string(),
            ]
        );
    }

    #[test]
    fn test_null_length_differs_from_number() {
        let source = vec![ColumnDescriptor::new("code", "varchar")];
        let dest = vec![ColumnDescriptor::new("code", "varchar").with_max_length(10)];
        assert_eq!(
            diff(&source, &dest),
            vec!["code: Data type mismatch varchar 10 != varchar null".to_string()]
        );
    }

    #[test]
    fn test_precision_and_scale_are_not_compared() {
        let source = vec![ColumnDescriptor::new("total", "decimal").with_precision(18, 2)];
        let dest = vec![ColumnDescriptor::new("total", "decimal").with_precision(10, 4)];
        assert!(diff(&source, &dest).is_empty());
    }

    #[test]
    fn test_source_errors_precede_extra_columns() {
        let source = vec![
            ColumnDescriptor::new("b", "int"),
            ColumnDescriptor::new("a", "int"),
        ];
        let dest = vec![
            ColumnDescriptor::new("z", "int"),
            ColumnDescriptor::new("y", "int"),
        ];
        assert_eq!(
            diff(&source, &dest),
            vec![
                "b: Column not found in destination database".to_string(),
                "a: Column not found in destination database".to_string(),
                "Extra column found in destination database: z".to_string(),
                "Extra column found in destination database: y".to_string(),
            ]
        );
    }
}
