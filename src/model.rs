use macroquad::prelude::*;

use crate::config::Difficulty;

pub type ColorValue = (u8, u8, u8);

/// Ordered `(color_id, rgb)` pairs. Levels with `n` colors use the first `n` entries.
pub const DEFAULT_WATER_COLORS: [(usize, ColorValue); 8] = [
    (0, (220, 40, 40)),   //RED
    (1, (40, 180, 70)),   //GREEN
    (2, (50, 90, 230)),   //BLUE
    (3, (240, 220, 40)),  //YELLOW
    (4, (245, 130, 200)), //PINK
    (5, (250, 150, 30)),  //ORANGE
    (6, (150, 60, 200)),  //PURPLE
    (7, (40, 210, 220)),  //CYAN
];

pub fn to_macroquad_color(color: ColorValue) -> Color {
    Color::from_rgba(color.0, color.1, color.2, 255)
}

/// A run of same-colored liquid inside a [`Bottle`].
///
/// Two segments compare equal when their `color_id` matches; amount, color and
/// label are display data and take no part in equality.
#[derive(Clone, Debug)]
pub struct LiquidSegment {
    color_id: usize,
    amount: usize,
    color: ColorValue,
    label: String,
}
impl LiquidSegment {
    pub fn new(color_id: usize, amount: usize, color: ColorValue) -> Self {
        Self::with_label(color_id, amount, color, "")
    }

    pub fn with_label(color_id: usize, amount: usize, color: ColorValue, label: &str) -> Self {
        let label = if label.is_empty() {
            color_id.to_string()
        } else {
            label.to_string()
        };
        Self {
            color_id,
            amount,
            color,
            label,
        }
    }

    pub fn get_color_id(&self) -> usize {
        self.color_id
    }
    pub fn get_amount(&self) -> usize {
        self.amount
    }
    pub fn get_color(&self) -> ColorValue {
        self.color
    }
    pub fn get_label(&self) -> &str {
        &self.label
    }

    /// Takes `amount` off this segment and returns it as a new segment.
    /// Splitting off nothing or everything is refused.
    pub fn split(&mut self, amount: usize) -> Option<LiquidSegment> {
        if amount == 0 || amount >= self.amount {
            return None;
        }
        self.amount -= amount;
        Some(Self {
            color_id: self.color_id,
            amount,
            color: self.color,
            label: self.label.clone(),
        })
    }

    pub fn add_amount(&mut self, amount: usize) {
        self.amount += amount;
    }

    pub fn get_text_representation(&self) -> String {
        self.label.repeat(self.amount)
    }
}
impl PartialEq for LiquidSegment {
    fn eq(&self, other: &Self) -> bool {
        self.color_id == other.color_id
    }
}
impl Eq for LiquidSegment {}

/// Fixed-capacity stack of [`LiquidSegment`]s, bottom to top.
#[derive(Clone, Debug)]
pub struct Bottle {
    capacity: usize,
    contents: Vec<LiquidSegment>,
}
impl Bottle {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            contents: Vec::new(),
        }
    }

    /// Builds a bottle from bottom-to-top contents. The capacity grows to fit
    /// the contents, adjacent equal segments are merged and empty segments
    /// are dropped.
    pub fn with_contents(capacity: usize, contents: Vec<LiquidSegment>) -> Self {
        let filled: usize = contents.iter().map(|s| s.amount).sum();
        let mut bottle = Self::new(capacity.max(filled));
        for segment in contents {
            bottle.return_segment(segment);
        }
        bottle
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.get_remaining_capacity() == 0
    }

    /// One color filling the whole bottle.
    pub fn is_sorted(&self) -> bool {
        self.contents.len() == 1 && self.is_full()
    }

    pub fn get_capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_filled_amount(&self) -> usize {
        self.contents.iter().map(|s| s.amount).sum()
    }

    pub fn get_remaining_capacity(&self) -> usize {
        self.capacity - self.get_filled_amount()
    }

    pub fn get_segments(&self) -> &[LiquidSegment] {
        &self.contents
    }

    pub fn get_top_segment(&self) -> Option<&LiquidSegment> {
        self.contents.last()
    }

    /// Removes liquid from the top segment. `None` takes the whole segment;
    /// `Some(n)` takes at most `n` units, leaving the rest in the bottle.
    pub fn pop_segment(&mut self, amount: Option<usize>) -> Option<LiquidSegment> {
        if amount == Some(0) {
            return None;
        }
        let mut segment = self.contents.pop()?;
        let amount = match amount {
            Some(amount) if amount < segment.amount => amount,
            _ => return Some(segment),
        };

        match segment.split(amount) {
            Some(poured) => {
                self.return_segment(segment);
                Some(poured)
            }
            None => {
                error!(
                    "Failed to split {} units off a segment of {}",
                    amount, segment.amount
                );
                debug_assert!(false, "split refused an amount smaller than the segment");
                self.contents.push(segment);
                None
            }
        }
    }

    /// Adds a segment on top, merging with the current top when the colors
    /// match. A segment that does not fit is handed back untouched; an empty
    /// one is accepted and dropped.
    pub fn push_segment(&mut self, segment: LiquidSegment) -> Result<(), LiquidSegment> {
        if segment.amount > self.get_remaining_capacity() {
            return Err(segment);
        }
        if segment.amount == 0 {
            return Ok(());
        }
        match self.contents.last_mut() {
            Some(top) if *top == segment => top.add_amount(segment.amount),
            _ => self.contents.push(segment),
        }
        Ok(())
    }

    /// How much `move_liquid(self, other)` would move. Zero when the pour is illegal.
    pub fn get_pourable_amount(&self, other: &Bottle) -> usize {
        let Some(top) = self.get_top_segment() else {
            return 0;
        };
        if let Some(other_top) = other.get_top_segment()
            && other_top != top
        {
            return 0;
        }
        top.amount.min(other.get_remaining_capacity())
    }

    pub fn could_pour_into(&self, other: &Bottle) -> bool {
        self.get_pourable_amount(other) > 0
    }

    /// Puts back liquid that was just taken out of this bottle. Liquid that
    /// no longer fits is logged and lost.
    pub fn return_segment(&mut self, segment: LiquidSegment) {
        if let Err(lost) = self.push_segment(segment) {
            error!(
                "Lost {} units of color {}: only {} units of room left",
                lost.amount,
                lost.color_id,
                self.get_remaining_capacity()
            );
        }
    }

    pub fn get_text_representation(&self) -> String {
        let mut repr = String::new();
        for segment in &self.contents {
            repr.push('|');
            repr.push_str(&segment.get_text_representation());
        }
        repr.push_str(&"_".repeat(self.get_remaining_capacity()));
        repr
    }
}

/// Pours as much of the top segment of `from` as fits into `to`.
/// Returns whether any liquid moved.
pub fn move_liquid(from: &mut Bottle, to: &mut Bottle) -> bool {
    let transfer_amount = from.get_pourable_amount(to);
    if transfer_amount == 0 {
        return false;
    }
    let Some(poured) = from.pop_segment(Some(transfer_amount)) else {
        return false;
    };
    match to.push_segment(poured) {
        Ok(()) => true,
        Err(poured) => {
            warn!("Pour of {} units was refused after the capacity check", poured.amount);
            from.return_segment(poured);
            false
        }
    }
}

/// Two distinct bottles of the same slice, borrowed mutably together.
pub fn pair_mut(bottles: &mut [Bottle], a: usize, b: usize) -> Option<(&mut Bottle, &mut Bottle)> {
    if a == b || a >= bottles.len() || b >= bottles.len() {
        return None;
    }
    if a < b {
        let (left, right) = bottles.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = bottles.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}

pub fn total_liquid(bottles: &[Bottle]) -> usize {
    bottles.iter().map(Bottle::get_filled_amount).sum()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlAction {
    SelectBottle(usize),
    Deselect,
    Restart,
    NewLevel,
    Undo,
    Redo,
    OpenMenu,
    ChooseDifficulty(Difficulty),
    CopyState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Button {
    label: String,
    action: ControlAction,
    color: Color,
}
impl Button {
    pub fn new(label: &str, action: ControlAction, color: Color) -> Self {
        Self {
            label: label.to_string(),
            action,
            color,
        }
    }
    pub fn get_action(&self) -> ControlAction {
        self.action
    }
    pub fn get_label(&self) -> &str {
        &self.label
    }
    pub fn get_color(&self) -> Color {
        self.color
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HitItem {
    Button { action: ControlAction },
    Bottle { index: usize },
    MenuItem { difficulty: Difficulty },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitRecord {
    pub rect: Rect,
    pub item: HitItem,
    pub order: usize,
}

#[derive(Default)]
pub struct HitTestRegistry {
    items: Vec<HitRecord>,
}

impl HitTestRegistry {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, rect: Rect, item: HitItem, order: usize) {
        self.items.push(HitRecord { rect, item, order });
    }

    /// Returns the topmost item under the point (highest draw order).
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&HitRecord> {
        self.items
            .iter()
            .filter(|r| r.rect.contains(vec2(x, y)))
            .max_by_key(|r| r.order)
    }
}
