//! End-to-end coverage of the wire format: round-trips, skip semantics,
//! error reporting, and the canonical save path.

use std::sync::Arc;

use pgex::{
    CallbackError, FileError, FileSchema, ObjectSchema, ParseError, StrInput,
};
use rstest::rstest;

#[derive(Default, Debug, Clone, PartialEq)]
struct Head {
    title: String,
    stars: u32,
    music: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq)]
struct Block {
    id: u32,
    x: i64,
    y: i64,
}

#[derive(Default, Debug, Clone, PartialEq)]
struct Merge {
    a: i32,
    b: i32,
}

#[derive(Default)]
struct Capture {
    heads: Vec<Head>,
    blocks: Vec<Block>,
    merged: Vec<Merge>,
    rejected_after: Option<u32>,
    errors: Vec<FileError>,
}

fn head_schema() -> Arc<ObjectSchema<Head>> {
    Arc::new(
        ObjectSchema::builder()
            .field("TL", |h: &Head| &h.title, |h: &mut Head| &mut h.title)
            .field("SZ", |h: &Head| &h.stars, |h: &mut Head| &mut h.stars)
            .field("MUS", |h: &Head| &h.music, |h: &mut Head| &mut h.music)
            .build(),
    )
}

fn block_schema() -> Arc<ObjectSchema<Block>> {
    Arc::new(
        ObjectSchema::builder()
            .field("ID", |b: &Block| &b.id, |b: &mut Block| &mut b.id)
            .field("X", |b: &Block| &b.x, |b: &mut Block| &mut b.x)
            .field("Y", |b: &Block| &b.y, |b: &mut Block| &mut b.y)
            .build(),
    )
}

fn merge_schema() -> Arc<ObjectSchema<Merge>> {
    Arc::new(
        ObjectSchema::builder()
            .field("A", |m: &Merge| &m.a, |m: &mut Merge| &mut m.a)
            .field("B", |m: &Merge| &m.b, |m: &mut Merge| &mut m.b)
            .build(),
    )
}

fn on_head(ctx: &mut Capture, head: Head) -> Result<bool, CallbackError> {
    ctx.heads.push(head);
    Ok(true)
}

fn on_block(ctx: &mut Capture, block: Block) -> Result<bool, CallbackError> {
    let accept = ctx.rejected_after.map_or(true, |limit| block.id <= limit);
    ctx.blocks.push(block);
    Ok(accept)
}

fn on_merge(ctx: &mut Capture, merge: Merge) -> Result<bool, CallbackError> {
    ctx.merged.push(merge);
    Ok(true)
}

fn on_error(ctx: &mut Capture, err: FileError) {
    ctx.errors.push(err);
}

fn put_head(ctx: &mut Capture, out: &mut Head, index: usize) -> bool {
    match ctx.heads.get(index) {
        Some(head) => {
            *out = head.clone();
            true
        }
        None => false,
    }
}

fn put_block(ctx: &mut Capture, out: &mut Block, index: usize) -> bool {
    match ctx.blocks.get(index) {
        Some(block) => {
            *out = block.clone();
            true
        }
        None => false,
    }
}

fn put_merge(ctx: &mut Capture, out: &mut Merge, index: usize) -> bool {
    match ctx.merged.get(index) {
        Some(merge) => {
            *out = merge.clone();
            true
        }
        None => false,
    }
}

fn file_schema() -> FileSchema<Capture> {
    FileSchema::builder()
        .section("HEAD", &head_schema(), Some(on_head), Some(put_head))
        .section("BLOCK", &block_schema(), Some(on_block), Some(put_block))
        .combine_section("MERGE", &merge_schema(), Some(on_merge), Some(put_merge))
        .build()
}

fn parse(text: &str) -> (bool, Capture) {
    let schema = file_schema();
    let mut ctx = Capture::default();
    let ok = schema.load(&mut StrInput::new(text), &mut ctx, Some(on_error));
    (ok, ctx)
}

#[rstest]
fn head_section_parses_and_reemits_identically() {
    let text = "HEAD\nTL:\"A\";SZ:3;\nHEAD_END\n";
    let (ok, mut ctx) = parse(text);
    assert!(ok);
    assert_eq!(ctx.heads.len(), 1);
    assert_eq!(ctx.heads[0].title, "A");
    assert_eq!(ctx.heads[0].stars, 3);

    let saved = file_schema().save_to_string(&mut ctx).unwrap();
    assert_eq!(saved, text);
}

#[rstest]
fn callback_veto_skips_rest_of_section() {
    let text = "BLOCK\nID:5;X:-10;Y:20;\nID:6;X:-10;Y:20;\nID:7;\nBLOCK_END\nHEAD\nTL:\"after\";\nHEAD_END\n";
    let schema = file_schema();
    let mut ctx = Capture {
        rejected_after: Some(5),
        ..Capture::default()
    };
    assert!(schema.load(&mut StrInput::new(text), &mut ctx, Some(on_error)));

    // Two callbacks fired (the second vetoed); the third record was never
    // parsed and the following section still loaded.
    assert_eq!(ctx.blocks.len(), 2);
    assert_eq!(ctx.blocks[0].id, 5);
    assert_eq!(ctx.blocks[1].id, 6);
    assert_eq!(ctx.heads.len(), 1);
    assert_eq!(ctx.heads[0].title, "after");
    assert!(ctx.errors.is_empty());
}

#[rstest]
fn overflow_reports_line_and_cause_chain() {
    let text = "HEAD\nSZ:99999999999999999999;\nHEAD_END\n";
    let (ok, ctx) = parse(text);
    assert!(!ok);
    assert_eq!(ctx.errors.len(), 1);

    let err = &ctx.errors[0];
    assert_eq!(err.line_number, 2);
    assert_eq!(err.line_data, "SZ:99999999999999999999;");
    assert!(err.info.starts_with("Failed to parse PGEX file (line 2)"));
    match &err.cause {
        ParseError::BadField(tag, Some(cause)) => {
            assert_eq!(tag.as_str(), "SZ");
            assert!(matches!(**cause, ParseError::BadTerm("Bad uint")));
        }
        other => panic!("expected BadField chain, got {other:?}"),
    }
}

#[rstest]
fn all_default_objects_contribute_no_bytes() {
    let schema = file_schema();
    let mut ctx = Capture {
        heads: vec![Head::default()],
        blocks: vec![Block::default(), Block::default()],
        ..Capture::default()
    };
    let saved = schema.save_to_string(&mut ctx).unwrap();
    assert_eq!(saved, "");
}

#[rstest]
fn string_list_round_trip() {
    let text = "HEAD\nMUS:[\"a\",\"b\"];\nHEAD_END\n";
    let (ok, mut ctx) = parse(text);
    assert!(ok);
    assert_eq!(ctx.heads[0].music, ["a", "b"]);
    assert_eq!(file_schema().save_to_string(&mut ctx).unwrap(), text);

    let tricky = "HEAD\nMUS:[\"a\\\"b\"];\nHEAD_END\n";
    let (ok, mut ctx) = parse(tricky);
    assert!(ok);
    assert_eq!(ctx.heads[0].music, ["a\"b"]);
    assert_eq!(file_schema().save_to_string(&mut ctx).unwrap(), tricky);
}

#[rstest]
fn combine_section_delivers_one_merged_object() {
    let text = "MERGE\nA:1;\nB:2;\nMERGE_END\n";
    let (ok, ctx) = parse(text);
    assert!(ok);
    assert_eq!(ctx.merged.len(), 1);
    assert_eq!(ctx.merged[0], Merge { a: 1, b: 2 });
}

#[rstest]
fn unknown_sections_are_skipped() {
    let text = "FOO\nanything goes here\nFOO_END\nHEAD\nTL:\"x\";\nHEAD_END\n";
    let (ok, ctx) = parse(text);
    assert!(ok);
    assert_eq!(ctx.heads.len(), 1);
    assert_eq!(ctx.heads[0].title, "x");
}

#[rstest]
fn unterminated_unknown_section_is_an_error() {
    let (ok, ctx) = parse("FOO\njunk\n");
    assert!(!ok);
    assert!(ctx.errors[0].info.contains("Unterminated section [FOO]"));
}

#[rstest]
fn malformed_header_line_is_an_error() {
    let (ok, ctx) = parse("not a header\n");
    assert!(!ok);
    assert!(matches!(ctx.errors[0].cause, ParseError::Misc(_)));
}

#[rstest]
fn record_without_semicolon_is_an_error() {
    let (ok, ctx) = parse("HEAD\nTL:\"A\"\nHEAD_END\n");
    assert!(!ok);
    assert!(matches!(
        ctx.errors[0].cause,
        ParseError::MissingDelimiter(';')
    ));
}

#[derive(Default, Debug, Clone, PartialEq)]
struct Arr {
    nums: Vec<i64>,
}

#[derive(Default)]
struct ArrCapture {
    arrs: Vec<Arr>,
    errors: Vec<FileError>,
}

fn arr_file() -> FileSchema<ArrCapture> {
    fn on_arr(ctx: &mut ArrCapture, arr: Arr) -> Result<bool, CallbackError> {
        ctx.arrs.push(arr);
        Ok(true)
    }

    let schema = Arc::new(
        ObjectSchema::builder()
            .field("N", |a: &Arr| &a.nums, |a: &mut Arr| &mut a.nums)
            .build(),
    );
    FileSchema::builder()
        .section("ARR", &schema, Some(on_arr), None)
        .build()
}

fn on_arr_error(ctx: &mut ArrCapture, err: FileError) {
    ctx.errors.push(err);
}

fn parse_arr(text: &str) -> (bool, ArrCapture) {
    let mut ctx = ArrCapture::default();
    let ok = arr_file().load(&mut StrInput::new(text), &mut ctx, Some(on_arr_error));
    (ok, ctx)
}

#[rstest]
fn list_terminator_strictness() {
    let (ok, ctx) = parse_arr("ARR\nN:[1,2];\nARR_END\n");
    assert!(ok);
    assert_eq!(ctx.arrs[0].nums, [1, 2]);

    let (ok, ctx) = parse_arr("ARR\nN:[1,];\nARR_END\n");
    assert!(!ok);
    match &ctx.errors[0].cause {
        ParseError::BadField(tag, Some(cause)) => {
            assert_eq!(tag.as_str(), "N");
            assert!(matches!(**cause, ParseError::UnexpectedCharacter(']')));
        }
        other => panic!("expected BadField, got {other:?}"),
    }
}

#[rstest]
fn empty_list_parses_to_empty() {
    let (ok, ctx) = parse_arr("ARR\nN:[];\nARR_END\n");
    assert!(ok);
    assert!(ctx.arrs[0].nums.is_empty());
}

#[rstest]
fn escape_universality_through_the_full_stack() {
    for byte in ["\n", "\r", "\"", ";", ":", "[", "]", ",", "%", "\\"] {
        let schema = file_schema();
        let mut ctx = Capture {
            heads: vec![Head {
                title: format!("a{byte}b"),
                ..Head::default()
            }],
            ..Capture::default()
        };
        let saved = schema.save_to_string(&mut ctx).unwrap();

        let mut reparsed = Capture::default();
        assert!(
            schema.load(&mut StrInput::new(&saved), &mut reparsed, Some(on_error)),
            "failed to reparse {saved:?}"
        );
        assert_eq!(reparsed.heads[0].title, ctx.heads[0].title, "byte {byte:?}");
    }
}

#[rstest]
fn two_generation_save_is_stable() {
    let text = concat!(
        "HEAD\n",
        "TL:\"Round trip\";SZ:7;MUS:[\"one.ogg\",\"two.ogg\"];\n",
        "HEAD_END\n",
        "BLOCK\n",
        "ID:1;X:-32;Y:64;\n",
        "ID:2;Y:-8;\n",
        "BLOCK_END\n",
    );
    let (ok, mut ctx) = parse(text);
    assert!(ok, "{:?}", ctx.errors);

    let first = file_schema().save_to_string(&mut ctx).unwrap();
    assert_eq!(first, text);

    let (ok, mut second_ctx) = parse(&first);
    assert!(ok);
    let second = file_schema().save_to_string(&mut second_ctx).unwrap();
    assert_eq!(second, first);
}

#[rstest]
fn blank_lines_are_tolerated_everywhere() {
    let text = "\nHEAD\n\nTL:\"A\";\n\nHEAD_END\n\nBLOCK\nID:1;\nBLOCK_END\n";
    let (ok, ctx) = parse(text);
    assert!(ok, "{:?}", ctx.errors);
    assert_eq!(ctx.heads.len(), 1);
    assert_eq!(ctx.blocks.len(), 1);
}

#[rstest]
fn callback_abort_surfaces_as_callback_error() {
    fn abort_block(_ctx: &mut Capture, block: Block) -> Result<bool, CallbackError> {
        Err(CallbackError::new(format!("bad block id {}", block.id)))
    }

    let schema: FileSchema<Capture> = FileSchema::builder()
        .section("BLOCK", &block_schema(), Some(abort_block), None)
        .build();
    let mut ctx = Capture::default();
    let ok = schema.load(
        &mut StrInput::new("BLOCK\nID:9;\nBLOCK_END\n"),
        &mut ctx,
        Some(on_error),
    );
    assert!(!ok);
    match &ctx.errors[0].cause {
        ParseError::Callback(message) => assert_eq!(message, "bad block id 9"),
        other => panic!("expected Callback, got {other:?}"),
    }
}

#[rstest]
fn section_without_load_callback_is_skipped() {
    let schema: FileSchema<Capture> = FileSchema::builder()
        .section("BLOCK", &block_schema(), None, None)
        .section("HEAD", &head_schema(), Some(on_head), None)
        .build();
    let mut ctx = Capture::default();
    let text = "BLOCK\nID:1;\nBLOCK_END\nHEAD\nTL:\"kept\";\nHEAD_END\n";
    assert!(schema.load(&mut StrInput::new(text), &mut ctx, Some(on_error)));
    assert!(ctx.blocks.is_empty());
    assert_eq!(ctx.heads[0].title, "kept");
}

#[rstest]
fn crlf_input_parses_like_lf() {
    let text = "HEAD\r\nTL:\"A\";SZ:3;\r\nHEAD_END\r\n";
    let (ok, ctx) = parse(text);
    assert!(ok);
    assert_eq!(ctx.heads[0].title, "A");
    assert_eq!(ctx.heads[0].stars, 3);
}
