//! Shared fixtures for record store tests.

#![allow(dead_code)]

use ledgerstate_store::model::{
    date, field_map, FieldDescriptor, FieldMap, FieldReader, ModelResult, Record, RecordHeader,
    RecordKey, RecordType, ReconstructionPath, Schema,
};
use ledgerstate_store::{MemoryStore, RecordStore, Selector, StoreConfig};
use serde_json::{json, Value};
use std::sync::{Arc, LazyLock, Once};

pub const ORG1: &str = "org1";
pub const ORG2: &str = "org2";
pub const AUDITOR: &str = "auditor";

/// An invoice. The discount is private to org1, the margin is shared by
/// org1 and org2 and audit findings are visible to the auditor only.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    header: RecordHeader,
    pub customer: String,
    pub amount: i64,
    pub status: String,
    pub issued: Option<chrono::DateTime<chrono::Utc>>,
    pub discount: Option<i64>,
    pub margin: Option<i64>,
    pub audit: Option<Audit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Audit {
    pub reviewer: String,
    pub finding: Option<String>,
}

pub static INVOICE_TYPE: LazyLock<Arc<RecordType<Invoice>>> = LazyLock::new(|| {
    Arc::new(
        RecordType::builder("Invoice")
            .field(FieldDescriptor::text("customer"))
            .field(FieldDescriptor::number("amount"))
            .field(FieldDescriptor::enumeration("status", &["DRAFT", "ISSUED", "PAID"]))
            .field(FieldDescriptor::date("issued"))
            .field(FieldDescriptor::number("discount").visible_in(r#""org1""#).unwrap())
            .field(
                FieldDescriptor::number("margin")
                    .visible_in(r#"anyOf("org1", "org2")"#)
                    .unwrap(),
            )
            .field(FieldDescriptor::nested(
                "audit",
                Schema::new(vec![
                    FieldDescriptor::text("reviewer"),
                    FieldDescriptor::text("finding")
                        .visible_in(r#""auditor""#)
                        .unwrap(),
                ]),
            ))
            .path(ReconstructionPath::default_path(
                "public",
                &["customer", "amount"],
                build_invoice,
            ))
            .path(
                ReconstructionPath::conditional(
                    "partner",
                    r#""org1" OR "org2""#,
                    &["customer", "amount"],
                    build_invoice,
                )
                .unwrap(),
            )
            .path(
                ReconstructionPath::conditional(
                    "org1",
                    r#""org1""#,
                    &["customer", "amount", "margin"],
                    build_invoice,
                )
                .unwrap(),
            )
            .path(
                ReconstructionPath::conditional("audit", r#""auditor""#, &["customer"], build_invoice)
                    .unwrap(),
            )
            .build()
            .unwrap(),
    )
});

/// A second type served by the same Rust struct, writing to its own partition.
pub static CREDIT_NOTE_TYPE: LazyLock<Arc<RecordType<Invoice>>> = LazyLock::new(|| {
    Arc::new(
        RecordType::builder("CreditNote")
            .field(FieldDescriptor::text("customer"))
            .field(FieldDescriptor::number("amount"))
            .field(FieldDescriptor::number("margin").visible_in(r#""org3""#).unwrap())
            .path(ReconstructionPath::default_path("public", &["customer"], build_invoice))
            .path(
                ReconstructionPath::conditional("org3", r#""org3""#, &["margin"], build_invoice)
                    .unwrap(),
            )
            .build()
            .unwrap(),
    )
});

fn build_invoice(header: RecordHeader, r: &FieldReader<'_>) -> ModelResult<Invoice> {
    let audit = match r.optional_nested("audit")? {
        Some(a) => Some(Audit {
            reviewer: a.string("reviewer")?,
            finding: a.optional("finding")?,
        }),
        None => None,
    };
    Ok(Invoice {
        header,
        customer: r.string("customer")?,
        amount: r.value("amount")?,
        status: r.optional("status")?.unwrap_or_else(|| "DRAFT".to_string()),
        issued: r.optional_date("issued")?,
        discount: r.optional("discount")?,
        margin: r.optional("margin")?,
        audit,
    })
}

impl Record for Invoice {
    fn header(&self) -> &RecordHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut RecordHeader {
        &mut self.header
    }

    fn to_fields(&self) -> FieldMap {
        field_map(json!({
            "customer": self.customer,
            "amount": self.amount,
            "status": self.status,
            "issued": self.issued.as_ref().map(date::format_date),
            "discount": self.discount,
            "margin": self.margin,
            "audit": self.audit.as_ref().map(|a| json!({
                "reviewer": a.reviewer,
                "finding": a.finding,
            })),
        }))
    }
}

impl Invoice {
    /// An unsealed public invoice.
    pub fn draft(id: &str, customer: &str, amount: i64) -> Self {
        Self::draft_of(&INVOICE_TYPE, id, customer, amount)
    }

    pub fn draft_of(record_type: &RecordType<Invoice>, id: &str, customer: &str, amount: i64) -> Self {
        Self {
            header: RecordHeader::new(record_type.name(), key(id)),
            customer: customer.into(),
            amount,
            status: "DRAFT".into(),
            issued: None,
            discount: None,
            margin: None,
            audit: None,
        }
    }

    pub fn with_margin(mut self, margin: i64) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn with_discount(mut self, discount: i64) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn with_audit(mut self, reviewer: &str, finding: &str) -> Self {
        self.audit = Some(Audit {
            reviewer: reviewer.into(),
            finding: Some(finding.into()),
        });
        self
    }

    pub fn sealed(self) -> Self {
        INVOICE_TYPE.seal(self)
    }
}

pub fn key(id: &str) -> RecordKey {
    RecordKey::from_parts(id.split(':')).unwrap()
}

pub fn selector(value: Value) -> Selector {
    match value {
        Value::Object(map) => map,
        other => panic!("selector must be an object, got {other}"),
    }
}

/// A memory store and a record store over it with the invoice type registered.
pub fn setup() -> (Arc<MemoryStore>, RecordStore<Invoice>) {
    setup_with(StoreConfig::default())
}

pub fn setup_with(config: StoreConfig) -> (Arc<MemoryStore>, RecordStore<Invoice>) {
    init_tracing();
    let memory = Arc::new(MemoryStore::new());
    let store = RecordStore::builder(memory.clone(), config)
        .register(INVOICE_TYPE.clone())
        .build()
        .unwrap();
    (memory, store)
}

pub fn ids(records: &[Invoice]) -> Vec<String> {
    records.iter().map(|r| r.key().to_string()).collect()
}

/// Sends log output to the test harness when `RUST_LOG` is set.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
