// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use product_import_staging::domain::compatibility::{
    CompatibilityData, CompatibilityEntry, COMPATIBILITY_DATA_VERSION,
};
use product_import_staging::domain::types::CompatibilityClass;
use product_import_staging::repository::CatalogRepositoryImpl;
use chrono::Utc;

// ==========================================
// CSV 文本构建器
// ==========================================

pub struct CsvBuilder {
    delimiter: char,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvBuilder {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            delimiter: ',',
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows.push(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn build(&self) -> String {
        let sep = self.delimiter.to_string();
        let mut out = self.headers.join(&sep);
        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.join(&sep));
        }
        out.push('\n');
        out
    }
}

/// 标准 5 行商品表（sku,name,manufacturer,price）
pub fn five_product_csv() -> String {
    CsvBuilder::new(&["SKU", "Name", "Manufacturer", "Price"])
        .row(&["bp-001", "Brake pad front", "Bosch", "120.50"])
        .row(&["bp-002", "Brake pad rear", "Bosch", "99"])
        .row(&["of-100", "Oil filter", "Mann", "35,90"])
        .row(&["af-200", "Air filter", "Mann", "42"])
        .row(&["sp-300", "Spark plug", "NGK", "18"])
        .build()
}

// ==========================================
// 目录种子数据
// ==========================================

/// 变体属性种子（颜色 2 值 × 尺寸 3 值）
pub struct SeededAttributes {
    pub color_type: i64,
    pub size_type: i64,
    pub red: i64,
    pub blue: i64,
    pub small: i64,
    pub medium: i64,
    pub large: i64,
}

pub fn seed_variant_attributes(catalog: &CatalogRepositoryImpl) -> SeededAttributes {
    let color_type = catalog.insert_attribute_type("Color", "color", 1).unwrap();
    let size_type = catalog.insert_attribute_type("Size", "size", 2).unwrap();

    let red = catalog
        .insert_attribute_value(color_type, "Red", Some("#ff0000"), None, Some(("R", true)))
        .unwrap();
    let blue = catalog
        .insert_attribute_value(color_type, "Blue", Some("#0000ff"), None, Some(("B", true)))
        .unwrap();
    let small = catalog
        .insert_attribute_value(size_type, "Small", None, None, Some(("S", true)))
        .unwrap();
    let medium = catalog
        .insert_attribute_value(size_type, "Medium", None, None, Some(("M", false)))
        .unwrap();
    let large = catalog
        .insert_attribute_value(size_type, "Large", None, None, Some(("L", true)))
        .unwrap();

    SeededAttributes {
        color_type,
        size_type,
        red,
        blue,
        small,
        medium,
        large,
    }
}

/// 车辆与适配属性种子
pub struct SeededVehicles {
    pub vehicle_ids: Vec<i64>,
    pub original_attr: i64,
    pub replacement_attr: i64,
}

pub fn seed_vehicles(catalog: &CatalogRepositoryImpl, count: usize) -> SeededVehicles {
    let vehicle_ids = (1..=count)
        .map(|n| {
            catalog
                .insert_vehicle(&format!("VEH-{}", n), &format!("Vehicle {}", n))
                .unwrap()
        })
        .collect();
    let original_attr = catalog.ensure_compatibility_attribute("Original").unwrap();
    let replacement_attr = catalog.ensure_compatibility_attribute("Replacement").unwrap();

    SeededVehicles {
        vehicle_ids,
        original_attr,
        replacement_attr,
    }
}

/// 目录商品已保存的适配快照
pub fn catalog_compatibility(
    vehicles: &SeededVehicles,
    entries: &[(usize, CompatibilityClass)],
) -> CompatibilityData {
    let compatibilities = entries
        .iter()
        .map(|(idx, class)| {
            let (attribute_id, attribute_name) = match class {
                CompatibilityClass::Original => (vehicles.original_attr, "Original"),
                CompatibilityClass::Replacement => (vehicles.replacement_attr, "Replacement"),
            };
            CompatibilityEntry {
                vehicle_id: vehicles.vehicle_ids[*idx],
                vehicle_sku: format!("VEH-{}", idx + 1),
                vehicle_name: format!("Vehicle {}", idx + 1),
                attribute_id,
                attribute_name: attribute_name.to_string(),
                source_id: 1,
                source_name: "Manual".to_string(),
                notes: String::new(),
                classification: Some(*class),
            }
        })
        .collect();

    CompatibilityData {
        version: COMPATIBILITY_DATA_VERSION,
        compatibilities,
        updated_at: Utc::now(),
    }
}
