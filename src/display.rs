use crate::{
    events::EdgeHandler,
    line::{Edge, EdgeEvent, LineId},
};

/// 可以显示一行文本的输出设备。
pub trait TextDisplay {
    type Error;

    fn show(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// 在收到边沿事件时把对应的提示文字送到显示设备上。
pub struct Announcer<'m, D: TextDisplay> {
    display: D,
    messages: &'m [(LineId, Edge, &'m str)],
}

impl<'m, D: TextDisplay> Announcer<'m, D> {
    /// # 参数
    /// * `display`: 输出设备。
    /// * `messages`: `(线路, 边沿, 文本)` 表，第一个匹配项生效。
    pub fn new(display: D, messages: &'m [(LineId, Edge, &'m str)]) -> Self {
        Self { display, messages }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn into_inner(self) -> D {
        self.display
    }
}

impl<D: TextDisplay> EdgeHandler for Announcer<'_, D> {
    fn on_edge(&mut self, event: &EdgeEvent) {
        let message = self
            .messages
            .iter()
            .find(|(line, edge, _)| *line == event.line && *edge == event.edge);
        if let Some((_, _, text)) = message {
            if self.display.show(text).is_err() {
                warn!("display rejected message for {}", event.line);
            }
        }
    }
}
