//! Shared `Trade` record used by the model tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use ledgerstate_model::{
    date, field_map, FieldDescriptor, FieldMap, FieldReader, ModelResult, Record, RecordHeader,
    RecordKey, RecordType, ReconstructionPath, Schema,
};
use serde_json::json;
use std::sync::LazyLock;

pub const TRADE: &str = "Trade";

/// A trade whose price is shared with both counterparties, whose notes are
/// private to the buyer and whose counterparty account is visible to the bank.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    header: RecordHeader,
    pub asset: String,
    pub quantity: i64,
    pub status: String,
    pub settled_at: Option<DateTime<Utc>>,
    pub price: Option<f64>,
    pub buyer_notes: Option<String>,
    pub counterparty: Option<Counterparty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Counterparty {
    pub name: String,
    pub account: Option<String>,
}

pub static TRADE_TYPE: LazyLock<RecordType<Trade>> = LazyLock::new(|| {
    RecordType::builder(TRADE)
        .field(FieldDescriptor::text("asset"))
        .field(FieldDescriptor::number("quantity"))
        .field(FieldDescriptor::enumeration("status", &["OPEN", "SETTLED"]))
        .field(FieldDescriptor::date("settled_at"))
        .field(
            FieldDescriptor::number("price")
                .visible_in(r#""buyer" OR "seller""#)
                .expect("price rule"),
        )
        .field(
            FieldDescriptor::text("buyer_notes")
                .visible_in(r#""buyer""#)
                .expect("notes rule"),
        )
        .field(FieldDescriptor::nested(
            "counterparty",
            Schema::new(vec![
                FieldDescriptor::text("name"),
                FieldDescriptor::text("account")
                    .visible_in(r#""bank""#)
                    .expect("account rule"),
            ]),
        ))
        .path(ReconstructionPath::default_path(
            "public",
            &["asset", "quantity", "status"],
            build_trade,
        ))
        .path(
            ReconstructionPath::conditional(
                "counterparty",
                r#"anyOf("buyer", "seller")"#,
                &["asset", "quantity", "status", "price"],
                build_trade,
            )
            .expect("counterparty path"),
        )
        .path(
            ReconstructionPath::conditional(
                "buyer",
                r#""buyer""#,
                &["asset", "quantity", "status", "price", "buyer_notes"],
                build_trade,
            )
            .expect("buyer path"),
        )
        .path(
            ReconstructionPath::conditional("bank", r#""bank""#, &["asset"], build_trade)
                .expect("bank path"),
        )
        .build()
        .expect("valid Trade type")
});

fn build_trade(header: RecordHeader, r: &FieldReader<'_>) -> ModelResult<Trade> {
    let counterparty = match r.optional_nested("counterparty")? {
        Some(n) => Some(Counterparty {
            name: n.string("name")?,
            account: n.optional("account")?,
        }),
        None => None,
    };
    Ok(Trade {
        header,
        asset: r.string("asset")?,
        quantity: r.value("quantity")?,
        status: r.string("status")?,
        settled_at: r.optional_date("settled_at")?,
        price: r.optional("price")?,
        buyer_notes: r.optional("buyer_notes")?,
        counterparty,
    })
}

impl Record for Trade {
    fn header(&self) -> &RecordHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut RecordHeader {
        &mut self.header
    }

    fn to_fields(&self) -> FieldMap {
        field_map(json!({
            "asset": self.asset,
            "quantity": self.quantity,
            "status": self.status,
            "settled_at": self.settled_at.as_ref().map(date::format_date),
            "price": self.price,
            "buyer_notes": self.buyer_notes,
            "counterparty": self.counterparty.as_ref().map(|c| json!({
                "name": c.name,
                "account": c.account,
            })),
        }))
    }
}

/// A sealed trade with every field populated.
pub fn full_trade(id: &str) -> Trade {
    TRADE_TYPE.seal(Trade {
        header: RecordHeader::new(TRADE, RecordKey::from_parts([id]).expect("key")),
        asset: "ACME".into(),
        quantity: 100,
        status: "OPEN".into(),
        settled_at: date::parse_date("2024-03-01T12:00:00Z"),
        price: Some(12.5),
        buyer_notes: Some("hedge".into()),
        counterparty: Some(Counterparty {
            name: "Globex".into(),
            account: Some("GB-001".into()),
        }),
    })
}

/// A sealed trade with only the base fields.
pub fn public_trade(id: &str) -> Trade {
    TRADE_TYPE.seal(Trade {
        header: RecordHeader::new(TRADE, RecordKey::from_parts([id]).expect("key")),
        asset: "ACME".into(),
        quantity: 7,
        status: "SETTLED".into(),
        settled_at: None,
        price: None,
        buyer_notes: None,
        counterparty: None,
    })
}

pub fn key(id: &str) -> RecordKey {
    RecordKey::from_parts([id]).expect("key")
}
