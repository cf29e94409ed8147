//! Round-trip properties of the layout interchange codec.
#![allow(missing_docs)]

use proptest::prelude::*;
use tessera_core::{
    DataSource, EnvironmentConfig, HttpMethod, LayoutDocument, WidgetConfig, WidgetType,
    LAYOUT_FORMAT_VERSION,
};

fn finite() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6f32
}

fn data_source() -> impl Strategy<Value = DataSource> {
    prop_oneof![
        "[a-z]{1,8}(/[a-z0-9]{1,8}){0,3}".prop_map(|topic| DataSource::Mqtt { topic }),
        (
            "https?://[a-z]{1,10}\\.local/[a-z]{0,8}",
            prop_oneof![
                prop::sample::select(vec![
                    HttpMethod::Get,
                    HttpMethod::Post,
                    HttpMethod::Put,
                    HttpMethod::Delete
                ]),
                "[A-Za-z]{3,7}".prop_map(HttpMethod::from),
            ]
        )
            .prop_map(|(url, method)| DataSource::Http { url, method }),
    ]
}

prop_compose! {
    fn widget_config()(
        id in "[a-f0-9]{8}",
        widget_type in prop::sample::select(WidgetType::ALL.to_vec()),
        label in ".{0,16}",
        data_source in data_source(),
        (x, y, width, height) in (finite(), finite(), finite(), finite()),
        value in ".{0,8}",
        limit in prop::option::of("[0-9]{1,3}\\.[0-9]"),
        extras in prop::option::of(prop::collection::vec("[A-Za-z]{1,6}", 0..4)),
        is_pinned in any::<bool>(),
        environment_id in 0i64..1000,
    ) -> WidgetConfig {
        WidgetConfig {
            id, widget_type, label, data_source, x, y, width, height, value,
            limit, extras, is_pinned, environment_id,
        }
    }
}

prop_compose! {
    fn layout_document()(
        id in 0i64..1000,
        name in ".{0,24}",
        scale in 0.05f32..20.0,
        (offset_x, offset_y) in (finite(), finite()),
        widgets in prop::collection::vec(widget_config(), 0..6),
    ) -> LayoutDocument {
        LayoutDocument {
            version: LAYOUT_FORMAT_VERSION,
            environment: EnvironmentConfig { id, name, scale, offset_x, offset_y },
            widgets,
        }
    }
}

proptest! {
    #[test]
    fn decode_inverts_encode(doc in layout_document()) {
        let bytes = doc.encode().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let decoded = LayoutDocument::decode(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(decoded, doc);
    }

    #[test]
    fn model_conversion_preserves_everything_but_value(doc in layout_document()) {
        let (environment, widgets) = doc.clone().into_model();
        let rebuilt = LayoutDocument::from_model(&environment, &widgets, &Default::default());

        prop_assert_eq!(&rebuilt.environment, &doc.environment);
        prop_assert_eq!(rebuilt.widgets.len(), doc.widgets.len());
        for (got, want) in rebuilt.widgets.iter().zip(&doc.widgets) {
            let mut want = want.clone();
            want.value = String::new();
            prop_assert_eq!(got, &want);
        }
    }
}
