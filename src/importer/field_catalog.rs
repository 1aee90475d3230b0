// ==========================================
// 商品导入暂存系统 - 目标字段目录
// ==========================================
// 职责: 暂存商品可映射字段 + 多语言同义词（波兰语 / 英语 / 德语 / 法语）
// 说明: 同义词均为规范化形式（小写、无变音符）
// ==========================================

use crate::domain::mapping::TargetField;
use crate::importer::staging_importer_trait::TargetFieldProvider;

/// 默认字段目录（24 个字段，sku / name 必填）
pub struct DefaultFieldCatalog;

impl TargetFieldProvider for DefaultFieldCatalog {
    fn available_fields(&self) -> Vec<TargetField> {
        vec![
            // ===== 标识 =====
            TargetField::new(
                "sku",
                "SKU",
                &[
                    "sku", "kod", "indeks", "reference", "ref", "product code", "item code",
                    "article number", "product number", "code article", "artykul", "symbol",
                    "kod produktu", "numer produktu", "symbol produktu", "artikelnummer",
                ],
                true,
            ),
            TargetField::new(
                "name",
                "商品名称",
                &[
                    "nazwa", "name", "tytul", "title", "product", "produkt", "nazwa produktu",
                    "product name", "item name", "description", "nom", "bezeichnung",
                    "denominazione",
                ],
                true,
            ),
            TargetField::new(
                "product_type",
                "商品类型",
                &[
                    "typ", "type", "rodzaj", "kategoria glowna", "product type", "typ produktu",
                    "rodzaj produktu",
                ],
                false,
            ),
            TargetField::new(
                "manufacturer",
                "制造商",
                &[
                    "producent", "manufacturer", "marka", "brand", "fabrikant", "wytworca",
                    "maker", "nazwa producenta", "manufacturer name", "hersteller",
                ],
                false,
            ),
            TargetField::new(
                "supplier_id",
                "供应商",
                &[
                    "dostawca", "supplier", "dostawca nazwa", "supplier name", "nazwa dostawcy",
                    "vendor", "lieferant",
                ],
                false,
            ),
            TargetField::new(
                "importer_id",
                "进口商",
                &["importer", "importer nazwa", "importer name", "nazwa importera"],
                false,
            ),
            TargetField::new(
                "supplier_code",
                "供应商编码",
                &[
                    "kod dostawcy", "supplier code", "dostawca kod", "external code",
                    "kod zewnetrzny",
                ],
                false,
            ),
            TargetField::new(
                "ean",
                "EAN",
                &["ean", "ean13", "barcode", "kod kreskowy", "gtin", "upc"],
                false,
            ),
            // ===== 物理属性 =====
            TargetField::new(
                "weight",
                "重量 (kg)",
                &[
                    "waga", "weight", "masa", "gewicht", "poids", "waga produktu",
                    "product weight",
                ],
                false,
            ),
            TargetField::new(
                "height",
                "高度 (cm)",
                &["wysokosc", "height", "h", "hohe"],
                false,
            ),
            TargetField::new(
                "width",
                "宽度 (cm)",
                &["szerokosc", "width", "w", "breite", "largeur"],
                false,
            ),
            TargetField::new(
                "length",
                "长度 (cm)",
                &["dlugosc", "length", "l", "lange", "longueur"],
                false,
            ),
            // ===== 价格与库存 =====
            TargetField::new(
                "price",
                "价格",
                &[
                    "cena", "price", "cena netto", "net price", "preis", "cena detaliczna",
                    "retail price",
                ],
                false,
            ),
            TargetField::new(
                "purchase_price",
                "采购价",
                &["cena zakupu", "purchase price", "cost", "koszt", "cena kosztowa"],
                false,
            ),
            TargetField::new(
                "quantity",
                "数量",
                &[
                    "ilosc", "quantity", "qty", "stock", "stan", "dostepnosc",
                    "stan magazynowy", "available", "quantite",
                ],
                false,
            ),
            // ===== 描述 =====
            TargetField::new(
                "short_description",
                "简短描述",
                &[
                    "krotki opis", "short description", "opis krotki", "summary",
                    "streszczenie", "description courte",
                ],
                false,
            ),
            TargetField::new(
                "long_description",
                "完整描述",
                &[
                    "pelny opis", "long description", "opis pelny", "opis", "description",
                    "detale", "details",
                ],
                false,
            ),
            TargetField::new(
                "category",
                "分类",
                &[
                    "kategoria", "category", "kategorie", "categories", "kategoria l3",
                    "main category",
                ],
                false,
            ),
            // ===== 车辆 =====
            TargetField::new(
                "vin",
                "VIN",
                &["vin", "numer vin", "vehicle identification number"],
                false,
            ),
            TargetField::new(
                "engine_number",
                "发动机号",
                &["numer silnika", "engine number", "engine no", "silnik"],
                false,
            ),
            TargetField::new(
                "model",
                "车型",
                &["model", "model pojazdu", "vehicle model", "car model"],
                false,
            ),
            TargetField::new(
                "year",
                "年份",
                &["rok", "year", "rocznik", "production year", "rok produkcji", "baujahr"],
                false,
            ),
            // ===== 适配 =====
            TargetField::new(
                "original_code",
                "原厂编码",
                &[
                    "oryginal", "original", "oe", "oe number", "numer oe", "original code",
                    "kod oryginalny",
                ],
                false,
            ),
            TargetField::new(
                "replacement_code",
                "替代编码",
                &[
                    "zamiennik", "replacement", "alternative", "alternatywa",
                    "kod zamiennika",
                ],
                false,
            ),
        ]
    }
}
