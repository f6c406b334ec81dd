use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info};

use crate::matching::names_overlap;
use crate::model::StorePrice;

pub const DEFAULT_STORES: [&str; 5] = ["Tesco", "Sainsbury's", "Asda", "Aldi", "Lidl"];

// Expected column headers
const STORE_COL: &str = "Store";
const ITEM_COL: &str = "Item";
const PACK_SIZE_COL: &str = "Pack Size";
const UNIT_COL: &str = "Unit";
const PRICE_COL: &str = "Price";

/// (item, pack size, unit, price per store in `DEFAULT_STORES` order)
const BUILTIN_ITEMS: &[(&str, f64, &str, [f64; 5])] = &[
    ("milk", 2.0, "l", [1.65, 1.65, 1.55, 1.45, 1.45]),
    ("eggs", 12.0, "", [3.10, 3.25, 2.95, 2.49, 2.55]),
    ("bread", 1.0, "loaf", [1.40, 1.45, 1.25, 0.99, 0.95]),
    ("butter", 250.0, "g", [2.45, 2.50, 2.39, 1.99, 1.99]),
    ("margarine", 500.0, "g", [1.75, 1.85, 1.60, 1.15, 1.19]),
    ("cheddar", 400.0, "g", [3.50, 3.75, 3.35, 2.89, 2.95]),
    ("mild cheese", 400.0, "g", [2.95, 3.10, 2.80, 2.39, 2.45]),
    ("chicken breast", 650.0, "g", [5.25, 5.50, 4.95, 4.49, 4.59]),
    ("beef mince", 500.0, "g", [3.95, 4.20, 3.80, 3.29, 3.39]),
    ("turkey mince", 500.0, "g", [3.50, 3.70, 3.35, 2.99, 2.99]),
    ("salmon", 240.0, "g", [4.25, 4.50, 4.00, 3.69, 3.79]),
    ("rice", 1.0, "kg", [1.90, 2.00, 1.70, 1.29, 1.35]),
    ("pasta", 500.0, "g", [0.95, 1.00, 0.85, 0.65, 0.69]),
    ("flour", 1.5, "kg", [1.10, 1.15, 0.95, 0.79, 0.85]),
    ("sugar", 1.0, "kg", [1.25, 1.30, 1.15, 0.99, 0.99]),
    ("olive oil", 500.0, "ml", [4.50, 4.75, 4.25, 3.49, 3.59]),
    ("vegetable oil", 1.0, "l", [2.20, 2.35, 2.10, 1.75, 1.79]),
    ("onion", 1.0, "kg", [1.00, 1.05, 0.89, 0.79, 0.79]),
    ("garlic", 4.0, "", [0.85, 0.90, 0.80, 0.59, 0.65]),
    ("tomato", 6.0, "", [1.10, 1.20, 0.99, 0.85, 0.89]),
    ("chopped tomatoes", 400.0, "g", [0.65, 0.70, 0.55, 0.39, 0.42]),
    ("potato", 2.5, "kg", [1.75, 1.85, 1.60, 1.29, 1.35]),
    ("carrot", 1.0, "kg", [0.75, 0.80, 0.69, 0.55, 0.55]),
    ("spinach", 250.0, "g", [1.50, 1.60, 1.45, 1.15, 1.19]),
    ("fresh basil", 30.0, "g", [0.90, 0.95, 0.85, 0.69, 0.69]),
    ("dried basil", 15.0, "g", [0.95, 1.10, 0.90, 0.59, 0.65]),
    ("greek yogurt", 500.0, "g", [2.10, 2.25, 1.95, 1.49, 1.55]),
    ("apple", 6.0, "", [2.00, 2.10, 1.85, 1.49, 1.49]),
    ("banana", 5.0, "", [0.90, 0.95, 0.85, 0.79, 0.79]),
    ("lemon", 4.0, "", [1.20, 1.25, 1.10, 0.89, 0.95]),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceCatalog {
    pub entries: Vec<StorePrice>,
}

impl PriceCatalog {
    pub fn new(entries: Vec<StorePrice>) -> Self {
        Self { entries }
    }

    /// The bundled table covering `DEFAULT_STORES`.
    pub fn builtin() -> Self {
        let entries = BUILTIN_ITEMS
            .iter()
            .flat_map(|(item, pack_size, unit, prices)| {
                DEFAULT_STORES.iter().zip(prices.iter()).map(move |(store, price)| StorePrice {
                    store: store.to_string(),
                    item: item.to_string(),
                    pack_size: *pack_size,
                    unit: unit.to_string(),
                    price: *price,
                })
            })
            .collect();
        Self { entries }
    }

    /// Distinct store names in first-seen order.
    pub fn stores(&self) -> Vec<&str> {
        let mut stores: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !stores.iter().any(|s| s.eq_ignore_ascii_case(&entry.store)) {
                stores.push(&entry.store);
            }
        }
        stores
    }

    pub fn entries_for(&self, store: &str) -> impl Iterator<Item = &StorePrice> + '_ {
        let store = store.trim().to_string();
        self.entries
            .iter()
            .filter(move |entry| entry.store.eq_ignore_ascii_case(&store))
    }

    /// Whole-word match in either direction between the needed name and
    /// catalog item names ("free-range eggs" finds "eggs", "mince" finds
    /// "beef mince"). The longest catalog name wins.
    pub fn lookup(&self, store: &str, item_name: &str) -> Option<&StorePrice> {
        self.entries_for(store)
            .filter(|entry| names_overlap(item_name, &entry.item))
            .max_by_key(|entry| entry.item.trim().len())
    }
}

fn parse_positive_f64(s: &str) -> Option<f64> {
    let value = s.trim().trim_start_matches('£').parse::<f64>().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Loads a catalog from CSV with headers `Store,Item,Pack Size,Unit,Price`.
/// Rows with blank names or unusable numbers are skipped.
pub fn load_price_catalog(csv_path: &Path) -> Result<PriceCatalog> {
    if !csv_path.exists() {
        return Err(anyhow!("Price catalog CSV file not found at: {:?}", csv_path));
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open price catalog CSV file at {:?}", csv_path))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(file);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found", name))
    };
    let store_idx = column(STORE_COL)?;
    let item_idx = column(ITEM_COL)?;
    let pack_idx = column(PACK_SIZE_COL)?;
    let unit_idx = column(UNIT_COL)?;
    let price_idx = column(PRICE_COL)?;

    let mut entries = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read record at row index {}", row_index))?;

        let store = record.get(store_idx).unwrap_or_default().to_string();
        let item = record.get(item_idx).unwrap_or_default().to_string();
        let pack_size = record.get(pack_idx).and_then(parse_positive_f64);
        let price = record.get(price_idx).and_then(parse_positive_f64);

        let (Some(pack_size), Some(price)) = (pack_size, price) else {
            debug!(row_index, "skipping price row with invalid pack size or price");
            continue;
        };
        if store.is_empty() || item.is_empty() {
            debug!(row_index, "skipping price row with blank store or item");
            continue;
        }

        entries.push(StorePrice {
            store,
            item,
            pack_size,
            unit: record.get(unit_idx).unwrap_or_default().to_string(),
            price,
        });
    }

    if entries.is_empty() {
        return Err(anyhow!("No valid price data loaded from {:?}", csv_path));
    }
    info!(count = entries.len(), path = ?csv_path, "price catalog loaded");

    Ok(PriceCatalog { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv_file() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{},{},{},{},{}", STORE_COL, ITEM_COL, PACK_SIZE_COL, UNIT_COL, PRICE_COL)?;
        writeln!(file, "Corner Shop,Milk,1,l,1.20")?;
        writeln!(file, "Corner Shop, Oat milk ,1,l,£1.80")?;
        writeln!(file, "Market,Milk,2,l,2.00")?;
        writeln!(file, ",Bread,1,loaf,1.00")?; // Blank store
        writeln!(file, "Market,Eggs,0,,2.00")?; // Zero pack size
        writeln!(file, "Market,Cheese,1,kg,free")?; // Invalid price
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_price_catalog_success() -> Result<()> {
        let file = create_test_csv_file()?;
        let catalog = load_price_catalog(file.path())?;

        assert_eq!(catalog.entries.len(), 3);
        assert_eq!(catalog.stores(), vec!["Corner Shop", "Market"]);

        let oat = catalog.lookup("corner shop", "oat milk").unwrap();
        assert_eq!(oat.item, "Oat milk");
        assert_eq!(oat.price, 1.80);
        Ok(())
    }

    #[test]
    fn test_load_price_catalog_missing_column() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{},{},{},{}", STORE_COL, ITEM_COL, UNIT_COL, PRICE_COL)?;
        writeln!(file, "Market,Milk,l,2.00")?;
        file.flush()?;

        let result = load_price_catalog(file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains(&format!("Column '{}' not found", PACK_SIZE_COL)));
        Ok(())
    }

    #[test]
    fn test_load_price_catalog_empty_file_with_headers() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{},{},{},{},{}", STORE_COL, ITEM_COL, PACK_SIZE_COL, UNIT_COL, PRICE_COL)?;
        file.flush()?;

        let result = load_price_catalog(file.path());
        assert!(result.unwrap_err().to_string().contains("No valid price data loaded"));
        Ok(())
    }

    #[test]
    fn test_load_price_catalog_file_not_found() {
        let result = load_price_catalog(Path::new("this_file_does_not_exist.csv"));
        assert!(result.unwrap_err().to_string().contains("Price catalog CSV file not found"));
    }

    #[test]
    fn builtin_covers_every_default_store() {
        let catalog = PriceCatalog::builtin();
        assert_eq!(catalog.stores(), DEFAULT_STORES.to_vec());
        assert_eq!(catalog.entries.len(), BUILTIN_ITEMS.len() * DEFAULT_STORES.len());
    }

    #[test]
    fn lookup_matches_substrings_both_ways() {
        let catalog = PriceCatalog::builtin();
        // Needed name contains the catalog name.
        assert_eq!(catalog.lookup("Aldi", "Free-range EGGS").unwrap().item, "eggs");
        // Catalog name contains the needed name.
        assert_eq!(catalog.lookup("aldi", "mince").unwrap().store, "Aldi");
        assert!(catalog.lookup("Aldi", "saffron").is_none());
        assert!(catalog.lookup("Aldi", "  ").is_none());
        assert!(catalog.lookup("Waitrose", "milk").is_none());
    }

    #[test]
    fn lookup_ignores_matches_inside_words() {
        let catalog = PriceCatalog::builtin();
        assert!(catalog.lookup("Tesco", "butternut squash").is_none());
        assert!(catalog.lookup("Tesco", "ice").is_none());
        assert_eq!(catalog.lookup("Tesco", "Potatoes").unwrap().item, "potato");
    }

    #[test]
    fn lookup_prefers_most_specific_entry() {
        let catalog = PriceCatalog::builtin();
        assert_eq!(catalog.lookup("Tesco", "tinned chopped tomatoes").unwrap().item, "chopped tomatoes");
        assert_eq!(catalog.lookup("Tesco", "extra virgin olive oil").unwrap().item, "olive oil");
    }
}
