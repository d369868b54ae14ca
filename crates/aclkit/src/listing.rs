//! Parser for `rpk acl list` output.
//!
//! The listing is a whitespace-aligned table with a header line:
//! ```text
//! PRINCIPAL   HOST  RESOURCE-TYPE  RESOURCE-NAME  RESOURCE-PATTERN-TYPE  OPERATION  PERMISSION  ERROR
//! User:alice  *     TOPIC          orders         LITERAL                READ       ALLOW
//! User:bob    *     CLUSTER        kafka-cluster  LITERAL                ALL        ALLOW
//! ```
//! The `ERROR` column is empty for healthy rows.

use crate::error::{Error, Result};
use crate::types::{
    CanonicalRule, NO_ERROR, Permission, Principal, ResourceType, RuleSet, TABLE_COLUMNS,
};

/// Parse a full listing, discarding the header line.
///
/// Any malformed line aborts the whole parse.
pub fn parse_listing(output: &str) -> Result<RuleSet> {
    let mut rules = RuleSet::new();

    for (index, line) in output.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        rules.insert(parse_line(line, index + 1)?);
    }

    log::debug!("parsed {} rules from ACL listing", rules.len());
    Ok(rules)
}

/// Parse a single data line of the listing.
///
/// Pattern type and operation are upper-cased, matching desired rows.
pub fn parse_line(line: &str, line_number: usize) -> Result<CanonicalRule> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    let (principal, host, resource_type, resource_name, pattern_type, operation, permission, error) =
        match fields.as_slice() {
            [p, h, rt, rn, pt, op, perm] => (p, h, rt, rn, pt, op, perm, NO_ERROR),
            [p, h, rt, rn, pt, op, perm, err] => (p, h, rt, rn, pt, op, perm, *err),
            _ => {
                return Err(Error::Parse {
                    line_number,
                    line: line.to_string(),
                    message: format!("expected 7 or 8 fields, found {}", fields.len()),
                });
            }
        };

    Ok(CanonicalRule {
        principal: Principal::parse(principal),
        host: (*host).to_string(),
        resource_type: ResourceType::parse(resource_type),
        resource_name: (*resource_name).to_string(),
        pattern_type: pattern_type.to_uppercase(),
        operation: operation.to_uppercase(),
        permission: Permission::parse(permission),
        error: error.to_string(),
    })
}

/// Render rules as an aligned table in the listing's own column layout.
///
/// The output parses back with [`parse_listing`] as long as no field
/// contains whitespace.
pub fn format_table<'a>(rules: impl IntoIterator<Item = &'a CanonicalRule>) -> String {
    let rows: Vec<[String; 8]> = rules.into_iter().map(CanonicalRule::columns).collect();

    let mut widths = TABLE_COLUMNS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let render = |cells: &[&str]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = render(&TABLE_COLUMNS);
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push('\n');
        out.push_str(&render(&cells));
    }
    out.push('\n');
    out
}
