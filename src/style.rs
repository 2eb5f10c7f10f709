//! Style: The display label attached to console and log records.
//!
//! The core treats labels as opaque; these types are what the bundled
//! console capture, log view and terminal presenter agree on.

use bitflags::bitflags;

/// True-color RGB representation.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Light gray used for plain output.
    pub const DEFAULT_FG: Self = Self::new(220, 220, 220);
    /// Red used for errors and stderr.
    pub const RED: Self = Self::new(200, 0, 0);
    /// Orange used for warnings.
    pub const ORANGE: Self = Self::new(200, 140, 0);
    /// Blue used for debug messages.
    pub const BLUE: Self = Self::new(0, 0, 200);
    /// Gray used for trace messages.
    pub const GRAY: Self = Self::new(128, 128, 128);
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

bitflags! {
    /// Text style modifiers.
    ///
    /// These can be combined using bitwise OR.
    ///
    /// # Example
    /// ```
    /// use livelog::Modifiers;
    /// let style = Modifiers::BOLD | Modifiers::ITALIC;
    /// assert!(style.contains(Modifiers::ITALIC));
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Bold text
        const BOLD = 0b0000_0001;
        /// Dim/faint text
        const DIM = 0b0000_0010;
        /// Italic text
        const ITALIC = 0b0000_0100;
        /// Underlined text
        const UNDERLINE = 0b0000_1000;
    }
}

impl std::fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Foreground color plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Style {
    /// Foreground color.
    pub fg: Rgb,
    /// Text modifiers.
    pub modifiers: Modifiers,
}

impl Default for Style {
    fn default() -> Self {
        Self::normal(Rgb::DEFAULT_FG)
    }
}

impl Style {
    /// Plain text in the given color.
    pub const fn normal(fg: Rgb) -> Self {
        Self {
            fg,
            modifiers: Modifiers::empty(),
        }
    }

    /// Italic text in the given color.
    pub const fn italic(fg: Rgb) -> Self {
        Self {
            fg,
            modifiers: Modifiers::ITALIC,
        }
    }

    /// Builder: add modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = self.modifiers.union(modifiers);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_debug_is_hex() {
        assert_eq!(format!("{:?}", Rgb::new(1, 2, 3)), "#010203");
    }

    #[test]
    fn test_style_constructors() {
        let style = Style::italic(Rgb::RED).with_modifiers(Modifiers::BOLD);
        assert!(style.modifiers.contains(Modifiers::ITALIC | Modifiers::BOLD));
        assert_eq!(Style::default().modifiers, Modifiers::empty());
    }
}
