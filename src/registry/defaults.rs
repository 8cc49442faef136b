//! Built-in sources and logical layers of the planning map.

use std::collections::BTreeMap;

use serde_json::json;

use super::{LayerDefinition, StyleRegistry, ThemeDefinition};
use crate::model::{ConcreteLayer, SourceDescriptor};

const TREE_GREEN: &str = "#2e7d32";
const HYDRANT_RED: &str = "#d32f2f";
const PERMIT_BLUE: &str = "#1565c0";
const PERMIT_YELLOW: &str = "#f9a825";
const PROJECT_GREY: &str = "#546e7a";

fn vector_source(name: &str) -> SourceDescriptor {
    SourceDescriptor::vector([format!("tiles/{}/{{z}}/{{x}}/{{y}}.pbf", name)])
        .zoom_levels(0.0, 16.0)
}

fn fill_and_outline(prefix: &str, source: &str, color: &str, minzoom: f64) -> Vec<ConcreteLayer> {
    vec![
        ConcreteLayer::new(format!("{}-fill", prefix), "fill")
            .source(source)
            .source_layer(source)
            .minzoom(minzoom)
            .paint("fill-color", json!(color))
            .paint("fill-opacity", json!(0.35)),
        ConcreteLayer::new(format!("{}-outline", prefix), "line")
            .source(source)
            .source_layer(source)
            .minzoom(minzoom)
            .paint("line-color", json!(color))
            .paint("line-width", json!(1.5)),
    ]
}

pub(super) fn build() -> StyleRegistry {
    let mut sources = BTreeMap::new();
    for name in [
        "street-trees",
        "fire-hydrants",
        "permits",
        "projects",
        "interventions",
    ] {
        sources.insert(name.to_string(), vector_source(name));
    }

    let mut layers = BTreeMap::new();

    layers.insert(
        "streetTrees".to_string(),
        LayerDefinition::Flat(vec![
            ConcreteLayer::new("street-trees", "circle")
                .source("street-trees")
                .source_layer("trees")
                .minzoom(14.0)
                .paint("circle-color", json!(TREE_GREEN))
                .paint("circle-radius", json!(3)),
            ConcreteLayer::new("street-trees-label", "symbol")
                .source("street-trees")
                .source_layer("trees")
                .minzoom(17.0)
                .layout("text-field", json!(["get", "species"]))
                .layout("text-size", json!(11)),
        ]),
    );

    layers.insert(
        "fireHydrants".to_string(),
        LayerDefinition::Flat(vec![ConcreteLayer::new("fire-hydrants", "circle")
            .source("fire-hydrants")
            .source_layer("hydrants")
            .minzoom(15.0)
            .paint("circle-color", json!(HYDRANT_RED))
            .paint("circle-radius", json!(4))]),
    );

    layers.insert(
        "permits".to_string(),
        LayerDefinition::Themed(vec![
            ThemeDefinition {
                theme_id: "default".to_string(),
                name: "Default".to_string(),
                layers: fill_and_outline("permits", "permits", PERMIT_BLUE, 12.0),
            },
            ThemeDefinition {
                theme_id: "yellow".to_string(),
                name: "Yellow".to_string(),
                layers: fill_and_outline("permits-yellow", "permits", PERMIT_YELLOW, 12.0),
            },
        ]),
    );

    let mut by_status = fill_and_outline("projects-status", "projects", PROJECT_GREY, 10.0);
    by_status[0].paint.insert(
        "fill-color".to_string(),
        json!([
            "match", ["get", "status"],
            "planned", "#90caf9",
            "ongoing", "#ffb74d",
            "completed", "#81c784",
            PROJECT_GREY
        ]),
    );
    layers.insert(
        "projects".to_string(),
        LayerDefinition::Themed(vec![
            ThemeDefinition {
                theme_id: "default".to_string(),
                name: "Default".to_string(),
                layers: fill_and_outline("projects", "projects", PROJECT_GREY, 10.0),
            },
            ThemeDefinition {
                theme_id: "byStatus".to_string(),
                name: "By status".to_string(),
                layers: by_status,
            },
        ]),
    );

    layers.insert(
        "interventions".to_string(),
        LayerDefinition::Flat(vec![
            ConcreteLayer::new("interventions-line", "line")
                .source("interventions")
                .source_layer("interventions")
                .filter(json!(["==", ["geometry-type"], "LineString"]))
                .paint("line-color", json!("#6a1b9a"))
                .paint("line-width", json!(3)),
            ConcreteLayer::new("interventions-point", "circle")
                .source("interventions")
                .source_layer("interventions")
                .minzoom(13.0)
                .filter(json!(["==", ["geometry-type"], "Point"]))
                .paint("circle-color", json!("#6a1b9a")),
        ]),
    );

    StyleRegistry::from_parts(sources, layers)
}
