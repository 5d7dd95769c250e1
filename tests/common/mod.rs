#![allow(dead_code)]

use chunked_xml::{Attributes, EventSink, Position, Result};

/// Records every event as one line so whole documents can be compared with a
/// single assertion.
#[derive(Default)]
pub struct EventLog(pub Vec<String>);

impl EventSink for EventLog {
    fn start_element(
        &mut self,
        name: &str,
        _colon_index: Option<usize>,
        attributes: &Attributes,
        self_closing: bool,
        _pos: Position,
    ) -> Result<()> {
        let attrs = attributes
            .iter()
            .map(|(n, v)| format!("{}={:?}", n, v))
            .collect::<Vec<_>>()
            .join(" ");
        self.0.push(format!(
            "start({} [{}] self_closing={})",
            name, attrs, self_closing
        ));
        Ok(())
    }

    fn end_element(&mut self, name: &str, _colon_index: Option<usize>, _pos: Position) -> Result<()> {
        self.0.push(format!("end({})", name));
        Ok(())
    }

    fn text(&mut self, content: &str, _pos: Position) -> Result<()> {
        self.0.push(format!("text({:?})", content));
        Ok(())
    }

    fn cdata(&mut self, content: &str, _pos: Position) -> Result<()> {
        self.0.push(format!("cdata({:?})", content));
        Ok(())
    }

    fn comment(&mut self, content: &str, _pos: Position) -> Result<()> {
        self.0.push(format!("comment({:?})", content));
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, content: &str, _pos: Position) -> Result<()> {
        self.0.push(format!("pi({} {:?})", target, content));
        Ok(())
    }

    fn declaration(
        &mut self,
        version: &str,
        encoding: Option<&str>,
        standalone: Option<bool>,
        _pos: Position,
    ) -> Result<()> {
        self.0.push(format!("decl({} {:?} {:?})", version, encoding, standalone));
        Ok(())
    }

    fn doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        _pos: Position,
    ) -> Result<()> {
        self.0.push(format!("doctype({} {:?} {:?})", name, public_id, system_id));
        Ok(())
    }
}
