//! Fenced code block tracking, so directives inside code stay literal.

/// Open fence: marker character and run length.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed one line. Returns `true` if it opened or closed a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let Some((ch, len)) = fence_run(line) else {
            return false;
        };

        match self.open {
            Some((open_ch, open_len)) => {
                let rest = &line.trim_start()[len..];
                if ch == open_ch && len >= open_len && rest.trim().is_empty() {
                    self.open = None;
                    return true;
                }
                false
            }
            None => {
                self.open = Some((ch, len));
                true
            }
        }
    }
}

/// Leading run of three or more backticks or tildes, indented at most
/// three spaces.
fn fence_run(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let ch = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = trimmed.chars().take_while(|&c| c == ch).count();
    (len >= 3).then_some((ch, len))
}
