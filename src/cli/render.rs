//! Protocol wrapper that overrides rendering options.

use pktview_core::protocol::{EnumType, OpcodeRegistry, Protocol, RenderOptions};
use pktview_core::{Dissector, Packet};

/// Delegates to an inner protocol, replacing its render options.
pub struct WithRenderOptions {
    inner: Box<dyn Protocol>,
    options: RenderOptions,
}

impl WithRenderOptions {
    /// Wrap `inner`, overriding only the options that are given.
    pub fn new(inner: Box<dyn Protocol>, indent: Option<usize>, hex_limit: Option<usize>) -> Self {
        let mut options = inner.render_options();
        if let Some(indent) = indent {
            options.indent_width = indent;
        }
        if let Some(limit) = hex_limit {
            options.hex_limit = limit;
        }
        Self { inner, options }
    }
}

impl Protocol for WithRenderOptions {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn display_name(&self) -> &'static str {
        self.inner.display_name()
    }

    fn opcode_type(&self) -> Option<EnumType> {
        self.inner.opcode_type()
    }

    fn registry(&self) -> Option<&OpcodeRegistry> {
        self.inner.registry()
    }

    fn render_options(&self) -> RenderOptions {
        self.options
    }

    fn select_dissector(&self, packet: &Packet) -> Dissector {
        self.inner.select_dissector(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pktview_core::find_protocol;

    #[test]
    fn test_partial_override() {
        let lobby = find_protocol("lobby").unwrap().unwrap();
        let base = lobby.render_options();
        let wrapped = WithRenderOptions::new(lobby, Some(4), None);

        assert_eq!(wrapped.name(), "lobby");
        assert_eq!(wrapped.render_options().indent_width, 4);
        assert_eq!(wrapped.render_options().hex_limit, base.hex_limit);
        assert!(wrapped.registry().is_some());
    }
}
