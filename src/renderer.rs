use std::{
    collections::HashMap,
    sync::Mutex,
};

use macroquad::prelude::*;
use crate::config::Difficulty;
use crate::model::{Bottle, Button, HitItem, HitTestRegistry, LiquidSegment, to_macroquad_color};

const MAX_COLUMNS: usize = 6;

#[derive(Hash, PartialEq, Eq, Clone, Debug)]
struct TextCacheKey {
    text: String,
    w_px: u16,
    h_px: u16,
}
type TextMaxSize = (f32, f32, f32);
pub struct CachedTextSizer {
    final_size_cache: Mutex<HashMap<TextCacheKey, TextMaxSize>>,
    unscaled_size_cache: Mutex<HashMap<String, (f32, f32)>>,
}

impl CachedTextSizer {
    pub fn new() -> Self {
        Self {
            final_size_cache: Mutex::new(HashMap::new()),
            unscaled_size_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Font size and x/y offsets that center `text` in the rect as large as it fits.
    pub fn get_text_max_size(&self, text: &str, rect_width: f32, rect_height: f32) -> TextMaxSize {
        let w_px = rect_width.round().clamp(0.0, u16::MAX as f32) as u16;
        let h_px = rect_height.round().clamp(0.0, u16::MAX as f32) as u16;

        let key = TextCacheKey {
            text: text.to_string(),
            w_px,
            h_px,
        };

        if let Ok(cache) = self.final_size_cache.lock()
            && let Some(cached_size) = cache.get(&key)
        {
            return *cached_size;
        }

        let text_size = self.measure(text, rect_width, rect_height);
        if let Ok(mut cache) = self.final_size_cache.lock() {
            cache.insert(key, text_size);
        }
        text_size
    }

    fn measure(&self, text: &str, rect_width: f32, rect_height: f32) -> TextMaxSize {
        let reference_size = 100u16;

        let (size_x, size_y) = if let Ok(cache) = self.unscaled_size_cache.lock()
            && let Some(dimensions) = cache.get(text)
        {
            (dimensions.0, dimensions.1)
        }
        else {
            let dimensions = measure_text(text, None, reference_size, 1.0);
            if let Ok(mut cache) = self.unscaled_size_cache.lock() {
                cache.insert(text.to_string(), (dimensions.width, dimensions.height));
            }
            (dimensions.width, dimensions.height)
        };
        if size_x <= 0.0 || size_y <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        let optimal_size = reference_size as f32 * (rect_width / size_x).min(rect_height / size_y);
        let final_width = size_x * (optimal_size / reference_size as f32);
        let final_height = size_y * (optimal_size / reference_size as f32);
        // draw_text places the baseline at y, so the offset includes the text height.
        let offset_x = (rect_width - final_width) / 2.0;
        let offset_y = (rect_height + final_height) / 2.0;
        (optimal_size, offset_x, offset_y)
    }
}
pub struct Renderer {
    cached_text_sizer: CachedTextSizer,
    hit_test: HitTestRegistry,
    draw_order: usize,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}
impl Renderer {
    pub fn new() -> Self {
        Self {
            cached_text_sizer: CachedTextSizer::new(),
            hit_test: HitTestRegistry::new(),
            draw_order: 0,
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 600.0,
        }
    }

    fn next_order(&mut self) -> usize {
        let o = self.draw_order;
        self.draw_order += 1;
        o
    }

    fn begin_frame(&mut self) {
        self.hit_test.clear();
        self.draw_order = 0;
        clear_background(BLACK);
    }

    pub fn get_hit_test_registry(&self) -> &HitTestRegistry {
        &self.hit_test
    }

    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) -> bool {
        if self.x == x && self.y == y && self.width == width && self.height == height {
            return false;
        }
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        true
    }

    pub fn autoset_viewport(&mut self) -> bool {
        let (screen_w, screen_h) = (screen_width(), screen_height());
        self.set_viewport(0.0, 0.0, screen_w, screen_h)
    }

    pub fn render_game(
        &mut self,
        bottles: &[Bottle],
        selected_bottle: Option<usize>,
        buttons: &[(&Button, bool)],
    ) {
        self.begin_frame();

        let area_padding = 10.0;
        let button_area_height = self.height * 0.1;
        let bottle_area_height = self.height - button_area_height - 2.0 * area_padding;
        self.render_button_lineup(
            buttons,
            Rect::new(self.x, self.y, self.width, button_area_height),
        );
        self.render_bottle_grid(
            bottles,
            selected_bottle,
            MAX_COLUMNS,
            Rect::new(
                self.x + area_padding,
                self.y + button_area_height + 2.0 * area_padding,
                self.width - 2.0 * area_padding,
                bottle_area_height - area_padding,
            ),
        );
    }

    pub fn render_menu(&mut self, title: &str, difficulties: &[Difficulty]) {
        self.begin_frame();

        let item_height = self.height * 0.08;
        let title_rect = Rect::new(self.x + self.width * 0.1, self.y + self.height * 0.1, self.width * 0.8, item_height * 1.5);
        self.render_text(title, title_rect, LIGHTGRAY);

        let (mouse_x, mouse_y) = mouse_position();
        for (i, difficulty) in difficulties.iter().enumerate() {
            let rect = Rect::new(
                self.x + self.width * 0.35,
                title_rect.bottom() + item_height * (0.5 + 1.25 * i as f32),
                self.width * 0.3,
                item_height,
            );
            let order = self.next_order();
            self.hit_test.push(rect, HitItem::MenuItem { difficulty: *difficulty }, order);
            let hovered = rect.contains(vec2(mouse_x, mouse_y));
            self.render_text(difficulty.get_label(), rect, if hovered { WHITE } else { GRAY });
        }

        // Water line across the bottom half.
        let water_y = self.y + self.height * 0.75;
        draw_rectangle(self.x, water_y, self.width, self.y + self.height - water_y, DARKBLUE);
    }

    pub fn render_text(
        &self,
        text: &str,
        rect: Rect,
        color: Color,
    ) {
        let (optimal_size, x, y) = self
            .cached_text_sizer
            .get_text_max_size(text, rect.w, rect.h);
        draw_text(text, rect.x + x, rect.y + y, optimal_size, color);
    }

    pub fn render_segment(
        &self,
        segment: &LiquidSegment,
        rect: Rect,
    ) {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, to_macroquad_color(segment.get_color()));
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 1.0, BLACK);
        let label_height = rect.h.min(rect.w) * 0.5;
        self.render_text(
            segment.get_label(),
            Rect::new(rect.x, rect.center().y - label_height / 2.0, rect.w, label_height),
            BLACK,
        );
    }

    pub fn render_bottle(
        &mut self,
        bottle: &Bottle,
        bottle_index: usize,
        selected: bool,
        pour_target: bool,
        rect: Rect,
    ) {
        // A selected bottle is drawn lifted, but the hit area stays put.
        let order = self.next_order();
        self.hit_test.push(rect, HitItem::Bottle { index: bottle_index }, order);
        let lift = if selected { rect.h * 0.05 } else { 0.0 };
        let rect = Rect::new(rect.x, rect.y - lift, rect.w, rect.h);

        let unit_height = rect.h / bottle.get_capacity() as f32;
        let mut filled = 0;
        for segment in bottle.get_segments() {
            let segment_height = unit_height * segment.get_amount() as f32;
            let segment_y = rect.bottom() - filled as f32 * unit_height - segment_height;
            self.render_segment(segment, Rect::new(rect.x, segment_y, rect.w, segment_height));
            filled += segment.get_amount();
        }
        let outline = if selected {
            WHITE
        } else if pour_target {
            LIME
        } else {
            GRAY
        };
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 4.0, outline);
    }

    pub fn render_bottle_lineup(
        &mut self,
        bottles: &[Bottle],
        selected: Option<usize>,
        source: Option<&Bottle>,
        start_index: usize,
        rect: Rect,
    ) {
        let bottle_count = bottles.len() as f32;
        let spacing = 20.0;
        let total_spacing = spacing * (bottle_count - 1.0);
        let bottle_width = ((rect.w - total_spacing) / bottle_count).min(rect.h * 0.35);
        let lineup_width = bottle_width * bottle_count + total_spacing;
        let start_x = rect.x + (rect.w - lineup_width) / 2.0;
        for (i, bottle) in bottles.iter().enumerate() {
            let bottle_index = start_index + i;
            let bottle_x = start_x + i as f32 * (bottle_width + spacing);
            let is_selected = Some(bottle_index) == selected;
            let pour_target = !is_selected && source.is_some_and(|from| from.could_pour_into(bottle));
            self.render_bottle(
                bottle,
                bottle_index,
                is_selected,
                pour_target,
                Rect::new(bottle_x, rect.y, bottle_width, rect.h),
            );
        }
    }

    pub fn render_bottle_grid(
        &mut self,
        bottles: &[Bottle],
        selected: Option<usize>,
        max_columns: usize,
        rect: Rect,
    ) {
        let bottle_count = bottles.len();
        if bottle_count == 0 {
            return;
        }
        let source = selected.and_then(|index| bottles.get(index));
        let rows = bottle_count.div_ceil(max_columns);
        let columns = bottle_count.div_ceil(rows);
        let spacing = 40.0;
        let total_spacing_y = spacing * (rows as f32 - 1.0);
        let bottle_height = (rect.h - total_spacing_y) / rows as f32;

        for row in 0..rows {
            let start_idx = row * columns;
            let end_idx = (start_idx + columns).min(bottle_count);
            let bottle_y = rect.y + row as f32 * (bottle_height + spacing);
            self.render_bottle_lineup(
                &bottles[start_idx..end_idx],
                selected,
                source,
                start_idx,
                Rect::new(rect.x, bottle_y, rect.w, bottle_height),
            );
        }
    }

    /// Disabled buttons are greyed out but still take clicks.
    pub fn render_button (
        &mut self,
        button: &Button,
        enabled: bool,
        rect: Rect,
    ) {
        let order = self.next_order();
        self.hit_test.push(rect, HitItem::Button { action: button.get_action() }, order);

        let (fill, text) = if enabled {
            (button.get_color(), WHITE)
        } else {
            (DARKGRAY, GRAY)
        };
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, fill);
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, BLACK);
        self.render_text(
            button.get_label(),
            rect,
            text,
        );
    }

    pub fn render_button_lineup(
        &mut self,
        buttons: &[(&Button, bool)],
        rect: Rect,
    ) {
        let button_count = buttons.len() as f32;
        let spacing = 10.0;
        let total_spacing = spacing * (button_count - 1.0);
        let button_width = (rect.w - total_spacing) / button_count;
        for (i, &(button, enabled)) in buttons.iter().enumerate() {
            let button_x = rect.x + i as f32 * (button_width + spacing);
            self.render_button(
                button,
                enabled,
                Rect::new(button_x, rect.y, button_width, rect.h),
            );
        }
    }
}
