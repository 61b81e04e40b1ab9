#[cfg(test)]
use crate::*;

#[cfg(test)]
use serde_json::json;

#[cfg(test)]
fn anchored_text(segments: &[&str]) -> AnchoredSegmentedText {
    AnchoredSegmentedText::new("r").with_segments(segments.iter().copied())
}

#[cfg(test)]
fn indexed_annotation(kind: &str, id: &str, begin: usize, end: usize) -> Annotation {
    Annotation::builder(kind, id)
        .with_resource("r")
        .with_range(begin, end)
        .build()
        .unwrap()
}

#[test]
fn anchor_order_ignores_identity() {
    let a = Anchor::with_identifier("a", 1.0);
    let b = Anchor::with_identifier("b", 1.0);
    let c = Anchor::with_identifier("a", 2.0);
    assert_eq!(a, b);
    assert!(!a.same_identity(&b));
    assert!(a.same_identity(&c));
    assert!(a < c);
}

#[test]
fn anchorref_mixed_kinds_incomparable() {
    let index = AnchorRef::Index(1);
    let anchor = AnchorRef::from(Anchor::with_identifier("a", 1.0));
    assert!(!(index < anchor));
    assert!(!(index > anchor));
    assert!(!(index <= anchor));
    assert_ne!(index, anchor);
}

#[test]
fn anchorref_parse_json() -> Result<(), serde_json::Error> {
    let index: AnchorRef = serde_json::from_str("4")?;
    assert_eq!(index.as_index(), Some(4));
    let anchor: AnchorRef = serde_json::from_str(r#"{"identifier":"x1","sequence_number":2.5}"#)?;
    let anchor = anchor.as_anchor().unwrap();
    assert_eq!(anchor.identifier(), "x1");
    assert_eq!(anchor.sequence_number(), 2.5);
    Ok(())
}

#[test]
fn integral_keys_serialize_as_integers() -> Result<(), StandoffError> {
    let mut text = anchored_text(&["ab", "c"]);
    let first = text.anchor(0)?.clone();
    text.split(&first, 1)?;
    let json = serde_json::to_value(text.anchors()).map_err(|e| {
        StandoffError::SerializationError(e.to_string())
    })?;
    assert_eq!(json[0]["sequence_number"], json!(0));
    assert!(json[0]["sequence_number"].is_u64());
    assert_eq!(json[1]["sequence_number"], json!(0.5));
    assert!(json[2]["sequence_number"].is_u64());
    // and they read back as order keys
    let parsed: Vec<Anchor> = serde_json::from_value(json).map_err(|e| {
        StandoffError::SerializationError(e.to_string())
    })?;
    assert_eq!(parsed[1].sequence_number(), 0.5);
    assert_eq!(parsed[2].sequence_number(), 1.0);
    Ok(())
}

#[test]
fn append_allocates_keys() {
    let text = anchored_text(&["a", "b", "c"]);
    assert_eq!(text.len(), 3);
    assert_eq!(text.anchors().len(), 3);
    let keys: Vec<f64> = text.anchors().iter().map(|a| a.sequence_number()).collect();
    assert_eq!(keys, vec![0.0, 1.0, 2.0]);
}

#[test]
fn element_at_by_position_kinds() -> Result<(), StandoffError> {
    let text = anchored_text(&["a", "b", "c"]);
    let anchor = text.anchor(1)?.clone();
    assert_eq!(text.element_at(1usize)?, "b");
    assert_eq!(text.element_at(&anchor)?, "b");
    assert_eq!(text.element_at(anchor.identifier())?, "b");
    Ok(())
}

#[test]
fn element_at_unknown_anchor() {
    let text = anchored_text(&["a", "b"]);
    let stranger = Anchor::with_identifier("nope", 1.0);
    assert!(matches!(
        text.element_at(&stranger),
        Err(StandoffError::LookupError(..))
    ));
    assert!(matches!(
        text.element_at(5usize),
        Err(StandoffError::LookupError(..))
    ));
}

#[test]
fn indexed_text_rejects_anchors() {
    let text = IndexedSegmentedText::new("r").with_segments(["a", "b"]);
    let anchor = Anchor::with_identifier("a", 0.0);
    assert!(text.element_at(&anchor).is_err());
    assert_eq!(text.element_at(1usize).unwrap(), "b");
}

#[test]
fn slice_length() -> Result<(), StandoffError> {
    let text = IndexedSegmentedText::new("r").with_segments(["a", "b", "c", "d", "e"]);
    for i in 0..5usize {
        for j in i..5 {
            assert_eq!(text.slice(i, j)?.len(), j - i + 1);
        }
    }
    assert!(text.slice(3usize, 1usize).is_err());
    Ok(())
}

#[test]
fn split_preserves_content_and_order() -> Result<(), StandoffError> {
    let mut text = anchored_text(&["Hello world", "next"]);
    let first = text.anchor(0)?.clone();
    let successor = text.anchor(1)?.clone();
    let new_anchor = text.split(&first, 5)?;
    assert_eq!(text.segments(), &["Hello", " world", "next"]);
    assert!(first < new_anchor);
    assert!(new_anchor < successor);
    assert_eq!(new_anchor.sequence_number(), 0.5);
    assert_eq!(text.element_at(&first)?, "Hello");
    assert_eq!(text.element_at(&new_anchor)?, " world");
    assert_eq!(text.element_at(&successor)?, "next");
    assert_eq!(text.anchors().len(), text.len());
    Ok(())
}

#[test]
fn split_unicode_offset() -> Result<(), StandoffError> {
    let mut text = anchored_text(&["Ünïcödé", "x"]);
    let first = text.anchor(0)?.clone();
    text.split(&first, 3)?;
    assert_eq!(text.segments(), &["Ünï", "cödé", "x"]);
    Ok(())
}

#[test]
fn split_last_anchor_fails() -> Result<(), StandoffError> {
    let mut text = anchored_text(&["a", "bc"]);
    let last = text.anchor(1)?.clone();
    assert!(matches!(
        text.split(&last, 1),
        Err(StandoffError::OrderingError(..))
    ));
    // nothing changed
    assert_eq!(text.segments(), &["a", "bc"]);
    Ok(())
}

#[test]
fn split_offset_out_of_range() -> Result<(), StandoffError> {
    let mut text = anchored_text(&["ab", "c"]);
    let first = text.anchor(0)?.clone();
    assert!(text.split(&first, 5).is_err());
    assert_eq!(text.len(), 2);
    Ok(())
}

#[test]
fn split_until_precision_exhausted_then_rekey() -> Result<(), StandoffError> {
    let mut text = anchored_text(&["a", "", "end"]);
    let middle = text.anchor(1)?.clone();
    let mut store = AnnotationStore::new().with_annotation(
        Annotation::builder("line", "l")
            .with_resource("r")
            .with_range(text.anchor(2)?, text.anchor(2)?)
            .build()?,
    );
    let mut failed = false;
    for _ in 0..100 {
        // each split halves the gap between the middle anchor and its successor
        if let Err(err) = text.split(&middle, 0) {
            assert!(matches!(err, StandoffError::OrderingError(..)));
            failed = true;
            break;
        }
    }
    assert!(failed, "float precision should run out within 100 halvings");
    let map = text.rekey();
    let keys: Vec<f64> = text.anchors().iter().map(|a| a.sequence_number()).collect();
    let expected: Vec<f64> = (0..text.len()).map(|i| i as f64).collect();
    assert_eq!(keys, expected);
    assert_eq!(store.rekey_anchors(&map), 0);
    let end = store.by_id("l")?.begin().as_anchor().unwrap().clone();
    assert_eq!(text.element_at(&end)?, "end");
    assert!(text.split(&middle, 0).is_ok());
    Ok(())
}

#[test]
fn slice_grid_keeps_upper_bound() -> Result<(), StandoffError> {
    let text = anchored_text(&["a", "bb", "c"]);
    let mut sub = text.slice_grid(0usize, 1usize)?;
    assert_eq!(sub.segments(), &["a", "bb"]);
    assert_eq!(sub.anchors().len(), 2);
    let last = sub.anchor(1)?.clone();
    let new_anchor = sub.split(&last, 1)?;
    assert_eq!(new_anchor.sequence_number(), 1.5);
    assert_eq!(sub.segments(), &["a", "b", "b"]);
    Ok(())
}

#[test]
fn extend_grid_verbatim() -> Result<(), StandoffError> {
    let mut text = anchored_text(&["a", "b"]);
    let other = anchored_text(&["c"]);
    let other_anchor = other.anchor(0)?.clone();
    text.extend_grid(other);
    assert_eq!(text.len(), 3);
    // keys are kept as they were, lookups still find the anchor
    assert_eq!(text.anchor(2)?.sequence_number(), 0.0);
    assert_eq!(text.element_at(&other_anchor)?, "c");
    Ok(())
}

#[test]
fn text_store_roundtrip() -> Result<(), StandoffError> {
    let anchored = anchored_text(&["Hello", "World"]);
    let indexed = IndexedSegmentedText::new("i").with_segments(["x", "y"]);
    let store = TextStore::new().with_text(anchored.clone())?.with_text(indexed)?;
    let json = store.to_json_string(&Config::default())?;
    assert!(json.contains("_resources"));
    assert!(json.contains("_anchors"));
    let parsed = TextStore::from_json_str(&json, &Config::default())?;
    let parsed_anchored = parsed.resource("r").unwrap().as_anchored().unwrap();
    assert_eq!(parsed_anchored.segments(), anchored.segments());
    for (a, b) in parsed_anchored.anchors().iter().zip(anchored.anchors()) {
        assert!(a.same_identity(b));
        assert_eq!(a.sequence_number(), b.sequence_number());
    }
    assert!(parsed.resource("i").unwrap().as_indexed().is_some());
    Ok(())
}

#[test]
fn text_store_rejects_anchor_count_mismatch() {
    let json = r#"{"_resources": [{"resource_id": "r", "_ordered_segments": ["x"],
        "_anchors": [{"identifier": "x", "sequence_number": 0}, {"identifier": "y", "sequence_number": 1}]}]}"#;
    assert!(matches!(
        TextStore::from_json_str(json, &Config::default()),
        Err(StandoffError::JsonError(..))
    ));
    let json = r#"{"resource_id": "r", "_ordered_segments": ["x", "y"],
        "_anchors": [{"identifier": "x", "sequence_number": 0}]}"#;
    assert!(serde_json::from_str::<AnchoredSegmentedText>(json).is_err());
}

#[test]
fn text_store_duplicate_resource() -> Result<(), StandoffError> {
    let mut store = TextStore::new();
    store.insert(IndexedSegmentedText::new("r"))?;
    assert!(store.insert(IndexedSegmentedText::new("r")).is_err());
    Ok(())
}

#[test]
fn annotation_begin_after_end() {
    let result = Annotation::builder("line", "l1")
        .with_resource("r")
        .with_range(3usize, 2usize)
        .build();
    assert!(matches!(result, Err(StandoffError::OrderingError(..))));
}

#[test]
fn annotation_requires_fields() {
    let result = Annotation::builder(AnnotationKind::Attendant, "a1")
        .with_resource("r")
        .with_range(0usize, 0usize)
        .with_extra("begin_char_offset", 0)
        .build();
    assert!(matches!(
        result,
        Err(StandoffError::StructuralMismatch(..))
    ));
    let result = Annotation::builder("line", "l1").with_range(0usize, 0usize).build();
    assert!(result.is_err());
}

#[test]
fn annotation_kind_strings() {
    assert_eq!(AnnotationKind::from("text_region"), AnnotationKind::TextRegion);
    assert_eq!(AnnotationKind::from("folio"), AnnotationKind::Other("folio".into()));
    assert_eq!(AnnotationKind::AttendanceList.to_string(), "attendance_list");
}

#[test]
fn annotation_json_shape() -> Result<(), serde_json::Error> {
    let annotation = Annotation::builder("line", "l1")
        .with_resource("r")
        .with_range(0usize, 1usize)
        .with_extra("n", 3)
        .build()
        .unwrap();
    let value = serde_json::to_value(&annotation)?;
    assert_eq!(
        value,
        json!({"resource_id": "r", "type": "line", "id": "l1", "begin_anchor": 0, "end_anchor": 1, "n": 3})
    );
    let parsed: Annotation = serde_json::from_value(value)?;
    assert_eq!(parsed.extra("n"), Some(&json!(3)));
    assert_eq!(parsed, annotation);
    Ok(())
}

#[test]
fn overlap_full_containment() {
    // a query range strictly inside the annotation
    let annotations = vec![indexed_annotation("line", "a", 0, 6)];
    let (b, e) = (AnchorRef::Index(2), AnchorRef::Index(5));
    let found: Vec<_> = overlapping(&b, &e, &annotations, "r").collect();
    assert_eq!(found.len(), 1);
}

#[test]
fn overlap_boundaries() {
    let annotations = vec![
        indexed_annotation("line", "left", 5, 9), // begins at the query end
        indexed_annotation("line", "right", 0, 2), // ends at the query begin
        indexed_annotation("line", "inside", 3, 4),
        indexed_annotation("line", "touching_end", 1, 5),
    ];
    let (b, e) = (AnchorRef::Index(2), AnchorRef::Index(5));
    let ids: Vec<&str> = overlapping(&b, &e, &annotations, "r")
        .map(|a| a.id())
        .collect();
    assert_eq!(ids, vec!["inside", "touching_end"]);
}

#[test]
fn overlap_other_resource() {
    let annotations = vec![indexed_annotation("line", "a", 0, 6)];
    let (b, e) = (AnchorRef::Index(2), AnchorRef::Index(5));
    assert_eq!(overlapping(&b, &e, &annotations, "other").count(), 0);
}

#[test]
fn query_iterators_restartable() {
    let annotations = vec![
        indexed_annotation("line", "a", 0, 0),
        indexed_annotation("page", "p", 0, 1),
        indexed_annotation("line", "b", 1, 1),
    ];
    let kind = AnnotationKind::Line;
    let iter = of_type(&kind, &annotations, Some("r"));
    assert_eq!(iter.clone().count(), 2);
    assert_eq!(iter.count(), 2);
    let (b, e) = (AnchorRef::Index(1), AnchorRef::Index(1));
    let found: Vec<_> = of_type_overlapping(&kind, &b, &e, &annotations, "r")
        .map(|a| a.id())
        .collect();
    assert_eq!(found, vec!["b"]);
}

#[test]
fn filter_from_pairs() -> Result<(), StandoffError> {
    let annotations = vec![
        Annotation::builder("line", "a")
            .with_resource("r")
            .with_range(0usize, 1usize)
            .with_owner("alice")
            .build()?,
        indexed_annotation("line", "b", 0, 1),
        indexed_annotation("page", "c", 0, 1),
    ];
    let (b, e) = (AnchorRef::Index(0), AnchorRef::Index(1));

    let filter = AnnotationFilter::from_pairs(Vec::<(&str, &str)>::new())?;
    assert_eq!(filtered_overlapping(&filter, &b, &e, &annotations, "r").count(), 3);

    let filter = AnnotationFilter::from_pairs([("type", "line")])?;
    assert_eq!(filtered_overlapping(&filter, &b, &e, &annotations, "r").count(), 2);

    let filter = AnnotationFilter::from_pairs([("type", "line"), ("owner", "alice")])?;
    let found: Vec<_> = filtered_overlapping(&filter, &b, &e, &annotations, "r")
        .map(|a| a.id())
        .collect();
    assert_eq!(found, vec!["a"]);

    assert!(matches!(
        AnnotationFilter::from_pairs([("colour", "red")]),
        Err(StandoffError::InvalidFilter(..))
    ));
    Ok(())
}

#[test]
fn by_id_missing() {
    let annotations = vec![indexed_annotation("line", "a", 0, 0)];
    assert!(by_id("a", &annotations).is_ok());
    assert!(find_by_id("zz", &annotations).is_none());
    let err = by_id("zz", &annotations).unwrap_err();
    assert!(matches!(err, StandoffError::NotFoundError(..)));
    assert!(!err.is_fatal());
}

#[test]
fn merge_duplicates_min_begin_max_end() {
    let mut store = AnnotationStore::from(vec![
        indexed_annotation("page", "p1", 4, 5),
        indexed_annotation("line", "l1", 0, 0),
        indexed_annotation("page", "p1", 2, 3),
        indexed_annotation("page", "p1", 2, 9),
        indexed_annotation("line", "l1", 1, 1),
    ]);
    let discarded = store.merge_duplicates(&[AnnotationKind::Page]);
    assert_eq!(discarded, 2);
    let pages: Vec<_> = store.of_type(&AnnotationKind::Page, None).collect();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].begin(), &AnchorRef::Index(2));
    assert_eq!(pages[0].end(), &AnchorRef::Index(9));
    // other types untouched
    assert_eq!(store.of_type(&AnnotationKind::Line, None).count(), 2);

    let before = store.clone();
    assert_eq!(store.merge_duplicates(&[AnnotationKind::Page]), 0);
    assert_eq!(store, before);
}

#[test]
fn anomaly_report_counts() {
    let mut report = AnomalyReport::new();
    report.record(Anomaly::LookupError {
        id: "l9".into(),
        context: "test".into(),
    });
    report.record(Anomaly::MergedDuplicates {
        annotation_type: "page".into(),
        discarded: 3,
    });
    let mut other = AnomalyReport::new();
    other.record(Anomaly::UnmatchedSpan {
        list_id: "al1".into(),
        offset: 1,
        end: 2,
    });
    report.merge(other);
    assert_eq!(report.lookup_errors(), 1);
    assert_eq!(report.merged_duplicates(), 3);
    assert_eq!(report.unmatched_spans(), 1);
    assert_eq!(report.iter().count(), 3);
    assert!(report.summary().contains("unmatched spans: 1"));
}

#[test]
fn config_parse_json() -> Result<(), serde_json::Error> {
    let config: Config = serde_json::from_str(r#"{"addressing": "anchored", "merge_types": ["page"]}"#)?;
    assert_eq!(config.addressing(), Addressing::Anchored);
    assert_eq!(config.merge_types(), &["page".to_string()]);
    assert_eq!(config.null_text(), "\n");
    assert_eq!(config.line_occurrence_threshold(), 1);
    Ok(())
}

#[test]
fn traversal_config_parse_json() -> Result<(), StandoffError> {
    let types = TraversalConfig::from_json_str(
        r#"{
            "session": {"child_key": "regions", "child_type": "text_region", "extra_fields": ["date"]},
            "text_region": {"child_key": "lines", "child_type": "line", "hook": "scan_page"},
            "line": {}
        }"#,
        &Config::default(),
    )?;
    assert_eq!(types.get("session")?.extra_fields(), &["date".to_string()]);
    assert!(types.get("line")?.is_leaf());
    assert!(types.get("paragraph").is_err());
    Ok(())
}

#[test]
fn traversal_config_dangling_child_type() {
    let result = TraversalConfig::from_json_str(
        r#"{"session": {"child_key": "regions", "child_type": "region"}}"#,
        &Config::default(),
    );
    assert!(matches!(
        result,
        Err(StandoffError::StructuralMismatch(..))
    ));
}

#[test]
fn traversal_null_text_and_extra_fields() -> Result<(), StandoffError> {
    let types = TraversalConfig::new()
        .with_type("doc", NodeTypeConfig::container("items", "item"))
        .with_type("item", NodeTypeConfig::leaf().with_extra_field("n"));
    let config = Config::default();
    let root = json!({"id": "d", "items": [
        {"id": "i1", "text": "one", "n": 1},
        {"id": "i2", "text": null, "n": 2},
        {"id": 3, "text": "three", "n": 3}
    ]});
    let (text, annotations) = Traversal::new(&types, &config, "r").run(&root, "doc")?;
    assert_eq!(text.segments(), &["one", "\n", "three"]);
    assert_eq!(annotations[2].id(), "3");
    assert_eq!(annotations[1].extra("n"), Some(&json!(2)));
    assert_eq!(annotations[3].id(), "d");
    assert_eq!(annotations[3].end(), &AnchorRef::Index(2));
    Ok(())
}

#[test]
fn traversal_missing_extra_field() {
    let types = TraversalConfig::new()
        .with_type("doc", NodeTypeConfig::container("items", "item"))
        .with_type("item", NodeTypeConfig::leaf().with_extra_field("n"));
    let config = Config::default();
    let root = json!({"id": "d", "items": [{"id": "i1", "text": "one"}]});
    match Traversal::new(&types, &config, "r").run(&root, "doc") {
        Err(StandoffError::StructuralMismatch(field, node, _)) => {
            assert_eq!(field, "n");
            assert_eq!(node.as_deref(), Some("i1"));
        }
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}

#[test]
fn traversal_missing_child_key() {
    let types = TraversalConfig::new()
        .with_type("doc", NodeTypeConfig::container("items", "item"))
        .with_type("item", NodeTypeConfig::leaf());
    let config = Config::default();
    let root = json!({"id": "d", "children": []});
    let err = Traversal::new(&types, &config, "r")
        .run(&root, "doc")
        .unwrap_err();
    assert!(matches!(err, StandoffError::StructuralMismatch(..)));
    assert!(err.is_fatal());
}

#[test]
fn traversal_context_tracks_open_nodes() -> Result<(), StandoffError> {
    #[derive(Debug)]
    struct RecordOpen;

    impl NodeHook for RecordOpen {
        fn apply(
            &self,
            _node: &serde_json::Value,
            begin: usize,
            end: usize,
            context: &TraversalContext,
            annotations: &mut Vec<Annotation>,
        ) -> Result<(), StandoffError> {
            // the enclosing section is still open while its items are visited
            let section_begin = context.open_begin("section").unwrap_or(usize::MAX);
            annotations.push(
                Annotation::builder("probe", format!("probe{}", begin))
                    .with_resource(context.resource_id())
                    .with_range(begin, end)
                    .with_extra("section_begin", section_begin)
                    .with_extra("depth", context.depth())
                    .build()?,
            );
            Ok(())
        }
    }

    let mut types = TraversalConfig::new()
        .with_type("doc", NodeTypeConfig::container("sections", "section"))
        .with_type("section", NodeTypeConfig::container("items", "item"))
        .with_type("item", NodeTypeConfig::leaf());
    types.set_hook("item", Box::new(RecordOpen))?;
    let config = Config::default();
    let root = json!({"id": "d", "sections": [
        {"id": "s1", "items": [{"id": "a", "text": "a"}]},
        {"id": "s2", "items": [{"id": "b", "text": "b"}, {"id": "c", "text": "c"}]}
    ]});
    let (_, annotations) = Traversal::new(&types, &config, "r").run(&root, "doc")?;
    let probe = annotations.iter().find(|a| a.id() == "probe2").unwrap();
    assert_eq!(probe.extra("section_begin"), Some(&json!(1)));
    assert_eq!(probe.extra("depth"), Some(&json!(3)));
    Ok(())
}

#[test]
fn scan_page_hook() -> Result<(), StandoffError> {
    let types = TraversalConfig::new()
        .with_type("session", NodeTypeConfig::container("regions", "text_region"))
        .with_type(
            "text_region",
            NodeTypeConfig::container("lines", "line").with_hook(Box::new(ScanPageHook::new())),
        )
        .with_type("line", NodeTypeConfig::leaf());
    let config = Config::default();
    let root = json!({"id": "s", "regions": [
        {"id": "r1", "metadata": {"scan_id": "sc1", "page_id": "pg1", "iiif_url": "https://example.org/1"},
         "lines": [{"id": "l1", "text": "a"}]},
        {"id": "r2", "metadata": {"scan_id": "sc1", "page_id": "pg1"},
         "lines": [{"id": "l2", "text": "b"}]}
    ]});
    let (_, annotations) = Traversal::new(&types, &config, "r").run(&root, "session")?;
    let mut store = AnnotationStore::from(annotations);
    assert_eq!(store.of_type(&AnnotationKind::Scan, None).count(), 2);
    store.merge_duplicates(&[AnnotationKind::Scan, AnnotationKind::Page]);
    let scan = store.by_id("sc1")?;
    assert_eq!(scan.begin(), &AnchorRef::Index(0));
    assert_eq!(scan.end(), &AnchorRef::Index(1));
    assert_eq!(scan.region_links(), &["https://example.org/1".to_string()]);
    assert_eq!(store.of_type(&AnnotationKind::Page, None).count(), 1);
    Ok(())
}

#[test]
fn collect_span_simple() -> Result<(), StandoffError> {
    let store = AnnotationStore::from(vec![
        indexed_annotation("line", "l1", 0, 0),
        indexed_annotation("line", "l2", 1, 1),
    ]);
    let index = LineIndex::new(&store);
    let paragraphs = vec![Paragraph {
        id: None,
        text: Some("abcdefghij".into()),
        line_ranges: vec![
            LineRange {
                line_id: "l1".into(),
                start: 0,
                end: 5,
            },
            LineRange {
                line_id: "l2".into(),
                start: 5,
                end: 10,
            },
        ],
    }];
    // a span ending exactly at the end of its line
    let position = collect_span_position(&paragraphs, 1, 5, &index)?;
    assert_eq!(position.begin_line, "l1");
    assert_eq!(position.end_line, "l1");
    assert_eq!(position.end_char_offset, 5);
    let position = collect_span_position(&paragraphs, 5, 7, &index)?;
    assert_eq!(position.begin_line, "l2");
    assert_eq!(position.begin_char_offset, 0);
    assert!(matches!(
        collect_span_position(&paragraphs, 11, 12, &index),
        Err(StandoffError::SpanResolutionError { .. })
    ));
    Ok(())
}

#[test]
fn line_index_first_occurrence_wins() {
    let store = AnnotationStore::from(vec![
        indexed_annotation("line", "l1", 0, 0),
        indexed_annotation("line", "l1", 4, 4),
        indexed_annotation("line", "l2", 1, 1),
    ]);
    let index = LineIndex::new(&store);
    assert_eq!(index.len(), 2);
    assert_eq!(index.get("l1").map(|(b, _)| b.clone()), Some(AnchorRef::Index(0)));
    assert_eq!(index.occurrences("l1"), 2);
    assert_eq!(index.duplicates(1), vec![("l1", 2)]);
    assert!(index.duplicates(2).is_empty());
}

#[cfg(feature = "textvalidation")]
#[test]
fn text_validation() -> Result<(), StandoffError> {
    let mut text = anchored_text(&["Hello", "World"]);
    let mut store = AnnotationStore::new().with_annotation(
        Annotation::builder("line", "l")
            .with_resource("r")
            .with_range(text.anchor(0)?, text.anchor(1)?)
            .build()?,
    );
    assert!(!store.has_validation_info());
    assert_eq!(store.make_validation_checksums(&text, "")?, 1);
    assert_eq!(
        store.by_id("l")?.validation_checksum(),
        Some(sha1_checksum("HelloWorld").as_str())
    );
    store.validate_text(&text, "", false)?;

    // splitting does not change the covered text
    let first = text.anchor(0)?.clone();
    text.split(&first, 2)?;
    store.validate_text(&text, "", false)?;
    assert!(matches!(
        store.validate_text(&text, " ", false),
        Err(StandoffError::ValidationError(..))
    ));
    Ok(())
}

#[cfg(feature = "csv")]
#[test]
fn annotations_to_csv() -> Result<(), StandoffError> {
    let store = AnnotationStore::from(vec![
        Annotation::builder("line", "l1")
            .with_resource("r")
            .with_range(0usize, 0usize)
            .with_owner("alice")
            .build()?,
        indexed_annotation("page", "p1", 0, 3),
    ]);
    let csv = store.to_csv_string()?;
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("resource_id,type,id,begin_anchor,end_anchor,owner")
    );
    assert_eq!(lines.next(), Some("r,line,l1,0,0,alice"));
    assert_eq!(lines.next(), Some("r,page,p1,0,3,"));
    Ok(())
}
