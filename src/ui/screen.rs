use ratatui::Frame;

use crate::{
    ui::{render_categories, render_quiz},
    App, AppState,
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Category picker shown at startup and after leaving a quiz
pub struct CategoryScreen;

impl Screen for CategoryScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        render_categories(app, area, f.buffer_mut());
    }
}

/// Loading, question, empty and completed views of a session
pub struct QuizScreen;

impl Screen for QuizScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        render_quiz(app, area, f.buffer_mut());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Categories => Box::new(CategoryScreen),
        AppState::Quiz => Box::new(QuizScreen),
    }
}
