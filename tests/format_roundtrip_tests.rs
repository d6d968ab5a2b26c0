//! Cross-format parse/serialize round-trip coverage and `FormatManager`
//! dispatch, exercising each text-based format at the crate boundary
//! rather than through its own module's inline tests.

use subx_core::formats::manager::FormatManager;
use subx_core::formats::{ass, sub, vtt};

#[test]
fn srt_round_trips_through_the_manager() {
    let mgr = FormatManager::new();
    let input = "1\n00:00:01,000 --> 00:00:02,500\n<b>Hello</b> world\n\n\
                 2\n00:00:03,000 --> 00:00:04,000\nSecond line\n";
    let doc = mgr.parse_auto(input).unwrap();
    assert_eq!(doc.events.len(), 2);

    let srt = mgr.get_format("srt").unwrap();
    let serialized = srt.serialize(&doc).unwrap();
    let reparsed = mgr.parse_auto(&serialized).unwrap();
    assert_eq!(reparsed.events.len(), doc.events.len());
    assert_eq!(reparsed.events[0].start, doc.events[0].start);
    assert_eq!(reparsed.events[1].text, doc.events[1].text);
}

#[test]
fn vtt_round_trips_with_regions_and_voice_tags() {
    let input = "WEBVTT\n\n\
                 REGION\nid:r1\nwidth:40%\nlines:2\n\n\
                 1\n00:00:01.000 --> 00:00:02.000\n<v Alice>Hi there</v>\n";
    let doc = vtt::parse(input).unwrap();
    assert_eq!(doc.regions.len(), 1);
    assert_eq!(doc.events.len(), 1);

    let serialized = vtt::serialize(&doc);
    let reparsed = vtt::parse(&serialized).unwrap();
    assert_eq!(reparsed.regions[0].id, "r1");
    assert_eq!(reparsed.events[0].start, doc.events[0].start);
}

#[test]
fn ass_round_trips_styles_and_dialogue() {
    let input = "[Script Info]\nTitle: Demo\nPlayResX: 1280\nPlayResY: 720\n\n\
                 [V4+ Styles]\nFormat: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
                 Style: Default,Arial,40,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1\n\n\
                 [Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n\
                 Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,Line one\n\
                 Dialogue: 0,0:00:05.00,0:00:06.00,Default,,0,0,0,,Line two\n";
    let doc = ass::parse(input).unwrap();
    assert_eq!(doc.events.len(), 2);
    assert_eq!(doc.styles.len(), 1);

    let serialized = ass::serialize(&doc).unwrap();
    let reparsed = ass::parse(&serialized).unwrap();
    assert_eq!(reparsed.events.len(), doc.events.len());
    assert_eq!(reparsed.styles.get("Default").unwrap().font_size, 40.0);
    assert_eq!(reparsed.events[1].text, "Line two");
}

#[test]
fn microdvd_round_trips_at_a_custom_frame_rate() {
    let input = "{0}{24}First cue|second line\n{25}{50}Second cue\n";
    let doc = sub::parse(input, 24.0);
    assert_eq!(doc.events.len(), 2);
    assert_eq!(doc.events[0].text, "First cue\nsecond line");

    let serialized = sub::serialize(&doc, 24.0);
    let reparsed = sub::parse(&serialized, 24.0);
    assert_eq!(reparsed.events.len(), doc.events.len());
    assert_eq!(reparsed.events[0].start, doc.events[0].start);
    assert_eq!(reparsed.events[1].end, doc.events[1].end);
}

#[test]
fn manager_rejects_content_no_registered_format_recognizes() {
    let mgr = FormatManager::new();
    let err = mgr.parse_auto("just some plain prose, not a subtitle file").unwrap_err();
    assert!(matches!(err, subx_core::error::SubxError::InvalidFormat { .. }));
}
