//! Pipeline definitions.
//!
//! Each supported export is described by a static [`PipelineSpec`]: which
//! reader opens it, how its headers map to canonical names, which columns
//! are coerced at load time, which fields are derived and which provenance
//! fields are appended.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::derive::DeriveRule;
use super::headers::HeaderMapping;
use crate::models::ColumnType;
use crate::parser::{ColumnCoercion, LoadOptions, WorkbookEngine};

/// Placeholder stored when the customs declaration number is unknown.
pub const GTD_UNKNOWN: &str = "Нет данных";

/// Provenance fields appended to every row, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetadataField {
    /// Fixed text
    Constant { name: String, value: String },
    /// Reporting month taken from the file name (fails if absent)
    ParsedOn { name: String },
    /// Base name of the input file
    FileName { name: String },
    /// Processing time, `YYYY-MM-DD HH:MM:SS`
    ProcessedAt { name: String },
}

impl MetadataField {
    pub fn name(&self) -> &str {
        match self {
            MetadataField::Constant { name, .. }
            | MetadataField::ParsedOn { name }
            | MetadataField::FileName { name }
            | MetadataField::ProcessedAt { name } => name,
        }
    }
}

/// Full description of one conversion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub name: String,
    pub engine: WorkbookEngine,
    /// Physical rows above the header
    #[serde(default)]
    pub skip_rows: usize,
    pub headers: Vec<HeaderMapping>,
    #[serde(default)]
    pub coercions: Vec<ColumnCoercion>,
    /// Applied all-or-nothing
    #[serde(default)]
    pub derive: Vec<DeriveRule>,
    #[serde(default)]
    pub metadata: Vec<MetadataField>,
}

impl PipelineSpec {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            skip_rows: self.skip_rows,
            coercions: self.coercions.clone(),
        }
    }

    pub fn needs_parsed_on(&self) -> bool {
        self.metadata
            .iter()
            .any(|m| matches!(m, MetadataField::ParsedOn { .. }))
    }

    /// Serialize this pipeline definition to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn headers(pairs: &[(&str, &str)]) -> Vec<HeaderMapping> {
    pairs
        .iter()
        .map(|(source, target)| HeaderMapping::new(*source, *target))
        .collect()
}

fn provenance() -> Vec<MetadataField> {
    vec![
        MetadataField::FileName {
            name: "original_file_name".to_string(),
        },
        MetadataField::ProcessedAt {
            name: "original_file_parsed_on".to_string(),
        },
    ]
}

/// Shipment export (legacy `.xls` only).
pub static SHIPMENT_EXPORT: Lazy<PipelineSpec> = Lazy::new(|| {
    let mut metadata = vec![
        MetadataField::Constant {
            name: "gtd_number".to_string(),
            value: GTD_UNKNOWN.to_string(),
        },
        MetadataField::ParsedOn {
            name: "parsed_on".to_string(),
        },
    ];
    metadata.extend(provenance());

    PipelineSpec {
        name: "shipment-export".to_string(),
        engine: WorkbookEngine::Legacy,
        skip_rows: 0,
        headers: headers(&[
            ("Терминал", "terminal"),
            ("Линия", "line"),
            ("Дата отгрузки", "shipment_date"),
            ("Количество", "container_count"),
            ("Размер контейнера", "container_size"),
            ("TEU", "teu"),
            ("Тип контейнера", "container_type"),
            ("Порт выгрузки", "tracking_seaport"),
            ("Страна выгрузки", "tracking_country"),
            ("Судно", "ship_name"),
            ("Рейс", "voyage"),
            ("Контейнер из партии", "container_number"),
            ("Отправитель", "shipper_name"),
            ("Получатель", "consignee_name"),
            ("Наименование товара", "goods_name"),
            ("Номер коносамента", "consignment"),
            ("Экспедитор", "expeditor"),
            ("ИНН Грузоотправителя", "shipper_inn"),
            ("ТНВЭД", "tnved"),
        ]),
        coercions: vec![
            ColumnCoercion::new("ИНН Грузоотправителя", ColumnType::Text),
            ColumnCoercion::new("Рейс", ColumnType::Text),
            ColumnCoercion::new("TEU", ColumnType::Integer),
            ColumnCoercion::new("ТНВЭД", ColumnType::Text),
        ],
        derive: vec![DeriveRule::parse_date(
            "shipment_date",
            &["%Y-%m-%d", "%d.%m.%Y", "%Y-%m-%d %H:%M:%S"],
        )],
        metadata,
    }
});

/// Orders report (any supported workbook format, one title row).
pub static ORDERS_REPORT: Lazy<PipelineSpec> = Lazy::new(|| PipelineSpec {
    name: "orders-report".to_string(),
    engine: WorkbookEngine::Auto,
    skip_rows: 1,
    headers: headers(&[
        ("Дата отхода с/з", "date"),
        ("Экспедитор", "expeditor"),
        ("Инд.", "individual"),
        ("№ конт.", "container"),
        ("Тип", "container_type_and_size"),
        ("Груз", "goods_name"),
        ("Порт назначения", "tracking_seaport"),
        ("Судно", "ship_name"),
        ("Линия", "line"),
    ]),
    coercions: Vec::new(),
    derive: vec![
        DeriveRule::parse_date(
            "date",
            &["%Y-%m-%d %H:%M:%S", "%d.%m.%Y", "%d.%m.%Y %H:%M:%S", "%d.%m.%Y %H:%M"],
        ),
        DeriveRule::concat("container_number", &["individual", "container"]),
        DeriveRule::split_whitespace(
            "container_type_and_size",
            &["container_type", "container_size"],
        ),
    ],
    metadata: provenance(),
});

/// The supported exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineKind {
    ShipmentExport,
    OrdersReport,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 2] = [PipelineKind::ShipmentExport, PipelineKind::OrdersReport];

    pub fn spec(&self) -> &'static PipelineSpec {
        match self {
            PipelineKind::ShipmentExport => &SHIPMENT_EXPORT,
            PipelineKind::OrdersReport => &ORDERS_REPORT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::ShipmentExport => "shipment-export",
            PipelineKind::OrdersReport => "orders-report",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown pipeline: {}", s))
    }
}
