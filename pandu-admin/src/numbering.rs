//! Sequential document numbering
//!
//! Every progression tier and badge award is issued a human-readable
//! document number of the form
//! `{5-digit sequence}/{TYPE-TAG}/{troop unit}-A/{year}`.
//!
//! Each namespace keeps its own counter row in `doc_counters`, incremented
//! atomically inside the issuing transaction, so concurrent issuance cannot
//! produce duplicate numbers.

use pandu_common::{Error, Result};
use sqlx::{Sqlite, Transaction};

/// Highest sequence value the 5-digit printed format can carry
pub const MAX_SEQUENCE: i64 = 99_999;

/// Independent numbering namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocNamespace {
    Tier1,
    Tier2,
    Tier3,
    Badge,
}

impl DocNamespace {
    /// Counter row key
    pub fn key(&self) -> &'static str {
        match self {
            DocNamespace::Tier1 => "tier1",
            DocNamespace::Tier2 => "tier2",
            DocNamespace::Tier3 => "tier3",
            DocNamespace::Badge => "badge",
        }
    }

    /// Document type tag, inherited from the domain's issued paperwork.
    /// Tier-1 and tier-2 certificates share a tag.
    pub fn tag(&self) -> &'static str {
        match self {
            DocNamespace::Tier1 | DocNamespace::Tier2 => "TKU-BANTU",
            DocNamespace::Tier3 => "TKU-TATA",
            DocNamespace::Badge => "TKK-SIAGA",
        }
    }
}

/// Atomically claim the next sequence value for a namespace
///
/// Runs inside the caller's transaction: the claimed value is only visible
/// once the issuing mutation commits. Values past [`MAX_SEQUENCE`] fail hard
/// rather than overflowing the printed 5-digit field.
pub async fn next_sequence(
    tx: &mut Transaction<'_, Sqlite>,
    namespace: DocNamespace,
) -> Result<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO doc_counters (namespace, value) VALUES (?, 1)
        ON CONFLICT(namespace) DO UPDATE SET value = value + 1
        RETURNING value
        "#,
    )
    .bind(namespace.key())
    .fetch_one(&mut **tx)
    .await?;

    if value > MAX_SEQUENCE {
        return Err(Error::Internal(format!(
            "document counter exhausted for namespace {}",
            namespace.key()
        )));
    }

    Ok(value)
}

/// Render a claimed sequence value as a full document number
pub fn format_document_number(
    sequence: i64,
    namespace: DocNamespace,
    unit: &str,
    year: i32,
) -> String {
    format!("{:05}/{}/{}-A/{}", sequence, namespace.tag(), unit, year)
}
