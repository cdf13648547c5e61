pub mod catalog;
pub mod error;
pub mod graph;
pub mod ir;
pub mod text;

use wasm_bindgen::prelude::*;

use catalog::{CatalogRows, Dialect};
use error::SchemaError;
use graph::{Normalizer, SchemaGraph};
use ir::{DetailLevel, GraphIR};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// A JS `Error` whose `name` is the machine-readable kind.
fn js_error(name: &str, message: &str) -> JsValue {
    let err = js_sys::Error::new(message);
    err.set_name(name);
    err.into()
}

fn schema_error(err: SchemaError) -> JsValue {
    js_error(err.kind().as_str(), &err.to_string())
}

fn json_string<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error("SerializationError", &e.to_string()))
}

fn build_graph(
    catalog: &str,
    dialect: Option<String>,
    schema: Option<String>,
) -> Result<SchemaGraph, JsValue> {
    let dialect = match dialect.as_deref() {
        Some(name) => Dialect::from_str(name)
            .ok_or_else(|| js_error("InvalidOptionError", &format!("unknown dialect: {name}")))?,
        None => Dialect::default(),
    };

    let mut rows: CatalogRows = serde_json::from_str(catalog)
        .map_err(|e| js_error("CatalogFormatError", &e.to_string()))?;
    if let Some(schema) = schema.as_deref() {
        rows.qualify(schema);
    }

    Normalizer::new(dialect)
        .normalize_rows(&rows)
        .map_err(schema_error)
}

fn parse_detail(detail: Option<&str>) -> Result<DetailLevel, String> {
    match detail {
        Some(name) => {
            DetailLevel::from_str(name).ok_or_else(|| format!("unknown detail level: {name}"))
        }
        None => Ok(DetailLevel::All),
    }
}

fn project(graph: &SchemaGraph, detail: Option<String>) -> Result<GraphIR, JsValue> {
    let detail =
        parse_detail(detail.as_deref()).map_err(|msg| js_error("InvalidOptionError", &msg))?;
    Ok(GraphIR::from_graph(graph, None, detail))
}

/// Normalize catalog rows JSON into schema graph JSON
#[wasm_bindgen(js_name = "normalizeCatalog")]
pub fn normalize_catalog(
    catalog: &str,
    dialect: Option<String>,
    schema: Option<String>,
) -> Result<String, JsValue> {
    let graph = build_graph(catalog, dialect, schema)?;
    json_string(&graph)
}

/// Normalize catalog rows JSON straight into diagram IR JSON
#[wasm_bindgen(js_name = "catalogToIr")]
pub fn catalog_to_ir(
    catalog: &str,
    dialect: Option<String>,
    schema: Option<String>,
    detail: Option<String>,
) -> Result<String, JsValue> {
    let graph = build_graph(catalog, dialect, schema)?;
    json_string(&project(&graph, detail)?)
}

/// A normalized graph held across editor actions.
#[wasm_bindgen]
pub struct SchemaEditor {
    graph: SchemaGraph,
}

#[wasm_bindgen]
impl SchemaEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(
        catalog: &str,
        dialect: Option<String>,
        schema: Option<String>,
    ) -> Result<SchemaEditor, JsValue> {
        let graph = build_graph(catalog, dialect, schema)?;
        Ok(Self { graph })
    }

    #[wasm_bindgen(js_name = "addReference")]
    pub fn add_reference(
        &mut self,
        referencing_table: &str,
        referencing_column: &str,
        target_table: &str,
        target_column: &str,
        constraint_name: &str,
    ) -> Result<(), JsValue> {
        self.graph
            .add_reference(
                referencing_table,
                referencing_column,
                target_table,
                target_column,
                constraint_name,
            )
            .map_err(schema_error)
    }

    #[wasm_bindgen(js_name = "removeReference")]
    pub fn remove_reference(
        &mut self,
        referencing_table: &str,
        referencing_column: &str,
        constraint_name: &str,
    ) -> Result<(), JsValue> {
        self.graph
            .remove_reference(referencing_table, referencing_column, constraint_name)
            .map(|_| ())
            .map_err(schema_error)
    }

    #[wasm_bindgen(js_name = "suggestConstraintName")]
    pub fn suggest_constraint_name(&self, table: &str, column: &str) -> Result<String, JsValue> {
        self.graph
            .suggest_constraint_name(table, column)
            .map_err(schema_error)
    }

    #[wasm_bindgen(js_name = "toJson")]
    pub fn to_json(&self) -> Result<String, JsValue> {
        json_string(&self.graph)
    }

    #[wasm_bindgen(js_name = "toIr")]
    pub fn to_ir(&self, detail: Option<String>) -> Result<String, JsValue> {
        json_string(&project(&self.graph, detail)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "columns": [
            {"table_name": "customers", "column_name": "id", "data_type": "integer", "is_nullable": "NO"},
            {"table_name": "orders", "column_name": "id", "data_type": "integer", "is_nullable": "NO"},
            {"table_name": "orders", "column_name": "cust_id", "data_type": "integer", "is_nullable": "YES"}
        ],
        "constraints": [
            {"constraint_name": "customers_pkey", "table_name": "customers", "column_name": "id",
             "constraint_type": "PRIMARY KEY"},
            {"constraint_name": "orders_pkey", "table_name": "orders", "column_name": "id",
             "constraint_type": "PRIMARY KEY"},
            {"constraint_name": "orders_fk1", "table_name": "orders", "column_name": "cust_id",
             "constraint_type": "FOREIGN KEY", "foreign_table_name": "customers", "foreign_column_name": "id"}
        ]
    }"#;

    #[test]
    fn test_normalize_catalog_json() {
        let json = normalize_catalog(CATALOG, None, Some("public".into())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["tables"][0]["name"], "public.customers");
        let edge = &value["tables"][1]["columns"][1]["references"][0];
        assert_eq!(edge["target_table"], "public.customers");
        assert_eq!(edge["constraint_name"], "orders_fk1");
    }

    #[test]
    fn test_detail_levels() {
        assert_eq!(parse_detail(None).unwrap(), DetailLevel::All);
        assert_eq!(parse_detail(Some("pk")).unwrap(), DetailLevel::Pk);
        assert_eq!(
            parse_detail(Some("columns")).unwrap_err(),
            "unknown detail level: columns"
        );
    }

    #[test]
    fn test_editor_round_trip() {
        let mut editor = SchemaEditor::new(CATALOG, Some("postgres".into()), None).unwrap();
        editor.remove_reference("orders", "cust_id", "orders_fk1").unwrap();
        assert_eq!(editor.suggest_constraint_name("orders", "cust_id").unwrap(), "orders_fk1");
        editor
            .add_reference("orders", "cust_id", "customers", "id", "orders_fk1")
            .unwrap();

        let ir: serde_json::Value = serde_json::from_str(&editor.to_ir(Some("pk_fk".into())).unwrap()).unwrap();
        assert_eq!(ir["edges"][0]["from_column"], "cust_id");
        assert_eq!(ir["nodes"][1]["columns"].as_array().unwrap().len(), 2);
    }
}
