use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use crate::cli::Column;

/// Columns shown in the table, in display order. `carid` is deliberately absent.
pub const DISPLAY_COLUMNS: [Column; 6] = [
    Column::Year,
    Column::Model,
    Column::Price,
    Column::Mileage,
    Column::Color,
    Column::Transmission,
];

/// The only column with an inline editor
pub const EDITABLE_COLUMN: Column = Column::Mileage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transmission {
    #[default]
    Auto,
    Standard,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Standard => "STANDARD",
        }
    }
}

/// One vehicle record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarData {
    pub carid: i64,
    pub year: u16,
    pub model: String,
    pub price: f64,
    pub mileage: f64,
    pub color: String,
    pub transmission: Transmission,
}

impl CarData {
    /// Text shown for `column` in this row
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Year => self.year.to_string(),
            Column::Model => self.model.clone(),
            Column::Price => format_number(self.price),
            Column::Mileage => format_number(self.mileage),
            Column::Color => self.color.clone(),
            Column::Transmission => self.transmission.as_str().to_string(),
        }
    }
}

/// A committed edit: the new value for one row's editable field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditedValue {
    pub row_id: i64,
    pub value: f64,
}

impl EditedValue {
    pub fn new(row_id: i64, value: f64) -> Self {
        Self { row_id, value }
    }
}

/// Complete inventory: header labels plus rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub header: Vec<String>,
    pub data: Vec<CarData>,
}

impl Inventory {
    /// Load an inventory from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read inventory at {}: {}", path.display(), e))?;
        Self::from_json_str(&content)
            .map_err(|e| eyre!("Failed to parse inventory at {}: {}", path.display(), e))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let mut inventory: Inventory = serde_json::from_str(content)?;
        if inventory.header.is_empty() {
            inventory.header = default_header();
        }
        inventory.validate()?;
        Ok(inventory)
    }

    /// Row ids must be unique and non-negative, mileage non-negative
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for car in &self.data {
            if car.carid < 0 {
                return Err(eyre!("carid must be non-negative, got {}", car.carid));
            }
            if !seen.insert(car.carid) {
                return Err(eyre!("duplicate carid {}", car.carid));
            }
            if !car.mileage.is_finite() || car.mileage < 0.0 {
                return Err(eyre!(
                    "mileage for carid {} must be a non-negative number",
                    car.carid
                ));
            }
        }
        if self.header.len() != DISPLAY_COLUMNS.len() {
            return Err(eyre!(
                "header must name {} columns, got {}",
                DISPLAY_COLUMNS.len(),
                self.header.len()
            ));
        }
        Ok(())
    }

    /// Built-in demo inventory
    pub fn sample() -> Self {
        const MODELS: [(&str, f64); 8] = [
            ("Honda Civic", 18500.0),
            ("Toyota Camry", 21900.0),
            ("Ford F-150", 32400.0),
            ("Subaru Outback", 24750.0),
            ("Mazda MX-5", 23100.0),
            ("Chevrolet Malibu", 17250.0),
            ("Volkswagen Golf", 16900.0),
            ("Jeep Wrangler", 29800.0),
        ];
        const COLORS: [&str; 5] = ["Black", "White", "Silver", "Red", "Blue"];

        let data = (0..40)
            .map(|i: i64| {
                let (model, base_price) = MODELS[i as usize % MODELS.len()];
                let age = (i % 9) as u16;
                CarData {
                    carid: i,
                    year: 2022 - age,
                    model: model.to_string(),
                    price: base_price - f64::from(age) * 1250.0,
                    mileage: f64::from(age) * 11000.0 + ((i * 731) % 5000) as f64,
                    color: COLORS[i as usize % COLORS.len()].to_string(),
                    transmission: if i % 4 == 3 {
                        Transmission::Standard
                    } else {
                        Transmission::Auto
                    },
                }
            })
            .collect();

        Self {
            header: default_header(),
            data,
        }
    }
}

/// Header labels for `DISPLAY_COLUMNS`
pub fn default_header() -> Vec<String> {
    DISPLAY_COLUMNS
        .iter()
        .map(|c| {
            let label = c.label();
            let mut chars = label.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Render a number without a trailing `.0` for whole values
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_columns_exclude_carid() {
        assert_eq!(DISPLAY_COLUMNS.len(), 6);
        assert_eq!(DISPLAY_COLUMNS[0], Column::Year);
        assert!(DISPLAY_COLUMNS.contains(&EDITABLE_COLUMN));
    }

    #[test]
    fn test_default_header() {
        assert_eq!(
            default_header(),
            vec!["Year", "Model", "Price", "Mileage", "Color", "Transmission"]
        );
    }

    #[test]
    fn test_cell_rendering() {
        let car = CarData {
            carid: 3,
            year: 2019,
            model: "Mazda MX-5".to_string(),
            price: 19999.5,
            mileage: 100.0,
            color: "Red".to_string(),
            transmission: Transmission::Standard,
        };
        assert_eq!(car.cell(Column::Mileage), "100");
        assert_eq!(car.cell(Column::Price), "19999.5");
        assert_eq!(car.cell(Column::Transmission), "STANDARD");
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "data": [
                {"carid": 0, "year": 2018, "model": "Civic", "price": 12000,
                 "mileage": 50000, "color": "Blue", "transmission": "AUTO"}
            ]
        }"#;
        let inv = Inventory::from_json_str(json).unwrap();
        assert_eq!(inv.data.len(), 1);
        assert_eq!(inv.data[0].transmission, Transmission::Auto);
        assert_eq!(inv.header, default_header());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{"data": [
            {"carid": 1, "year": 2018, "model": "A", "price": 1, "mileage": 1, "color": "x", "transmission": "AUTO"},
            {"carid": 1, "year": 2018, "model": "B", "price": 1, "mileage": 1, "color": "x", "transmission": "AUTO"}
        ]}"#;
        assert!(Inventory::from_json_str(json).is_err());
    }

    #[test]
    fn test_sample_is_valid() {
        let inv = Inventory::sample();
        assert_eq!(inv.data.len(), 40);
        inv.validate().unwrap();
    }
}
