use crate::map::Popup;
use crate::types::{Activity, Workout};
use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Render one `<li>` entry of the workout list.
pub fn render_entry(w: &Workout) -> Result<String> {
    let mut xml = Writer::new(Vec::new());
    let kind = w.kind();
    let class = format!("workout workout--{kind}");

    xml.write_event(Event::Start(
        BytesStart::new("li").with_attributes([("class", class.as_str()), ("data-id", w.id())]),
    ))?;

    xml.write_event(Event::Start(
        BytesStart::new("h2").with_attributes([("class", "workout__title")]),
    ))?;
    xml.write_event(Event::Text(BytesText::new(w.description())))?;
    xml.write_event(Event::End(BytesEnd::new("h2")))?;

    write_detail(&mut xml, kind.icon(), &w.distance().to_string(), "km")?;
    write_detail(&mut xml, "⏱", &w.duration().to_string(), "min")?;
    match *w.activity() {
        Activity::Running { cadence, pace } => {
            write_detail(&mut xml, "⚡️", &format!("{pace:.1}"), "min/km")?;
            write_detail(&mut xml, "🦶🏼", &cadence.to_string(), "spm")?;
        }
        Activity::Cycling {
            elevation_gain,
            speed,
        } => {
            write_detail(&mut xml, "⚡️", &format!("{speed:.1}"), "km/h")?;
            write_detail(&mut xml, "⛰", &elevation_gain.to_string(), "m")?;
        }
    }

    xml.write_event(Event::End(BytesEnd::new("li")))?;

    String::from_utf8(xml.into_inner()).context("list entry is not UTF-8")
}

fn write_detail(xml: &mut Writer<Vec<u8>>, icon: &str, value: &str, unit: &str) -> Result<()> {
    xml.write_event(Event::Start(
        BytesStart::new("div").with_attributes([("class", "workout__details")]),
    ))?;
    for (class, text) in [
        ("workout__icon", icon),
        ("workout__value", value),
        ("workout__unit", unit),
    ] {
        xml.write_event(Event::Start(
            BytesStart::new("span").with_attributes([("class", class)]),
        ))?;
        xml.write_event(Event::Text(BytesText::new(text)))?;
        xml.write_event(Event::End(BytesEnd::new("span")))?;
    }
    xml.write_event(Event::End(BytesEnd::new("div")))?;
    Ok(())
}

pub fn popup(w: &Workout) -> Popup {
    Popup {
        content: format!("{} {}", w.kind().icon(), w.description()),
        class_name: format!("{}-popup", w.kind()),
        max_width: 250,
        min_width: 100,
        auto_close: false,
        close_on_click: false,
    }
}
