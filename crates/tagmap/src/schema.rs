//! Required column sets.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sheet::Table;

/// Columns every schema requires, in check order.
const BASIC_COLUMNS: &[&str] = &[
    "name",
    "latitude",
    "longitude",
    "description",
    "penanggung_jawab",
    "mulai_pekerjaan",
    "volume_scaffolding",
];

/// Strict schema: the basic columns followed by the work-order columns.
const STRICT_COLUMNS: &[&str] = &[
    "name",
    "latitude",
    "longitude",
    "description",
    "penanggung_jawab",
    "mulai_pekerjaan",
    "volume_scaffolding",
    "tanggal_spk",
    "group",
    "progress",
    "area",
];

/// Which column set an upload must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// All eleven columns, including work-order details.
    #[default]
    Strict,
    /// Only the seven core columns.
    Basic,
}

impl std::fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Basic => write!(f, "basic"),
        }
    }
}

/// Positions of the known columns in a validated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Columns {
    pub name: usize,
    pub latitude: usize,
    pub longitude: usize,
    pub description: usize,
    pub penanggung_jawab: usize,
    pub mulai_pekerjaan: usize,
    pub volume_scaffolding: usize,
    /// Strict-schema columns are `None` under the basic schema.
    pub tanggal_spk: Option<usize>,
    pub group: Option<usize>,
    pub progress: Option<usize>,
    pub area: Option<usize>,
}

/// Header validator for one [`SchemaVariant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    variant: SchemaVariant,
}

impl Schema {
    /// Create a validator for the given variant.
    #[must_use]
    pub fn new(variant: SchemaVariant) -> Self {
        Self { variant }
    }

    /// The variant this schema checks.
    #[must_use]
    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// Required column names in check order.
    #[must_use]
    pub fn required(&self) -> &'static [&'static str] {
        match self.variant {
            SchemaVariant::Strict => STRICT_COLUMNS,
            SchemaVariant::Basic => BASIC_COLUMNS,
        }
    }

    /// Check that every required column is present and locate them.
    ///
    /// Names match exactly and case-sensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] naming the first missing column.
    pub fn validate(&self, table: &Table) -> Result<Columns> {
        if let Some(missing) = self
            .required()
            .iter()
            .find(|column| table.column(column).is_none())
        {
            return Err(Error::missing_column(*missing));
        }

        let find = |name: &str| {
            table
                .column(name)
                .ok_or_else(|| Error::missing_column(name))
        };
        let optional = |name: &str| match self.variant {
            SchemaVariant::Strict => find(name).map(Some),
            SchemaVariant::Basic => Ok(None),
        };

        Ok(Columns {
            name: find("name")?,
            latitude: find("latitude")?,
            longitude: find("longitude")?,
            description: find("description")?,
            penanggung_jawab: find("penanggung_jawab")?,
            mulai_pekerjaan: find("mulai_pekerjaan")?,
            volume_scaffolding: find("volume_scaffolding")?,
            tanggal_spk: optional("tanggal_spk")?,
            group: optional("group")?,
            progress: optional("progress")?,
            area: optional("area")?,
        })
    }
}
