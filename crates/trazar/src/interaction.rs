//! Workbench interaction handles.
//!
//! Page objects for the chrome around the canvas: tool palette, label
//! editor, hover popup, command palette, and context menu. All of them are
//! plain [`PageElement`]s over root-level locators, so hosting-context
//! prefixing applies uniformly.

use crate::app::DiagramApp;
use crate::driver::ElementState;
use crate::element::{Locateable, PageElement};
use crate::locator::Locator;
use crate::result::TrazarResult;
use crate::selector::Selector;

/// Class of the tool palette container
pub const TOOL_PALETTE_CLASS: &str = "tool-palette";
/// Class of a tool palette item
pub const TOOL_BUTTON_CLASS: &str = "tool-button";
/// Class of the label editor container
pub const LABEL_EDITOR_CLASS: &str = "label-editor";
/// Class of the hover popup container
pub const POPUP_CLASS: &str = "diagram-popup";
/// Class of the command palette container
pub const COMMAND_PALETTE_CLASS: &str = "command-palette";
/// Class of a command palette suggestion
pub const SUGGESTION_CLASS: &str = "suggestion";
/// Class of the context menu container
pub const CONTEXT_MENU_CLASS: &str = "context-menu";
/// Class of a context menu item
pub const MENU_ITEM_CLASS: &str = "menu-item";

/// The tool palette beside the canvas
#[derive(Debug, Clone)]
pub struct ToolPalette {
    element: PageElement,
}

impl ToolPalette {
    pub(crate) fn new(app: DiagramApp) -> Self {
        Self {
            element: PageElement::new(Locator::new(
                app,
                Selector::has_class(TOOL_PALETTE_CLASS),
            )),
        }
    }

    /// A palette item by its visible name
    #[must_use]
    pub fn item(&self, name: &str) -> PaletteItem {
        PaletteItem {
            element: PageElement::new(
                self.element
                    .locator()
                    .child(Selector::has_class(TOOL_BUTTON_CLASS).with_text(name)),
            ),
        }
    }
}

impl Locateable for ToolPalette {
    fn locator(&self) -> &Locator {
        self.element.locator()
    }
}

/// One tool palette item
#[derive(Debug, Clone)]
pub struct PaletteItem {
    element: PageElement,
}

impl PaletteItem {
    /// Activate the tool
    pub async fn select(&self) -> TrazarResult<()> {
        self.element.locator().click().await
    }
}

impl Locateable for PaletteItem {
    fn locator(&self) -> &Locator {
        self.element.locator()
    }
}

/// The inline label editor
#[derive(Debug, Clone)]
pub struct LabelEditor {
    element: PageElement,
}

impl LabelEditor {
    pub(crate) fn new(app: DiagramApp) -> Self {
        Self {
            element: PageElement::new(Locator::new(
                app,
                Selector::has_class(LABEL_EDITOR_CLASS),
            )),
        }
    }

    /// Whether the editor is currently open
    pub async fn is_open(&self) -> TrazarResult<bool> {
        self.element.is_visible().await
    }

    /// Replace the edited label and commit with Enter
    pub async fn overwrite(&self, text: &str) -> TrazarResult<()> {
        let input = self.element.locator().child(Selector::tag("input"));
        input.type_text(text).await?;
        self.app().driver().press_key("Enter").await
    }

    /// Abort the edit with Escape
    pub async fn cancel(&self) -> TrazarResult<()> {
        self.app().driver().press_key("Escape").await
    }
}

impl Locateable for LabelEditor {
    fn locator(&self) -> &Locator {
        self.element.locator()
    }
}

/// The hover popup
#[derive(Debug, Clone)]
pub struct Popup {
    element: PageElement,
}

impl Popup {
    pub(crate) fn new(app: DiagramApp) -> Self {
        Self {
            element: PageElement::new(Locator::new(app, Selector::has_class(POPUP_CLASS))),
        }
    }

    /// Wait until the popup is rendered
    pub async fn wait_open(&self) -> TrazarResult<()> {
        self.element.wait_for(ElementState::Visible).await
    }

    /// The popup's text content
    pub async fn text(&self) -> TrazarResult<String> {
        self.element.text().await
    }
}

impl Locateable for Popup {
    fn locator(&self) -> &Locator {
        self.element.locator()
    }
}

/// The global command palette
#[derive(Debug, Clone)]
pub struct CommandPalette {
    element: PageElement,
}

impl CommandPalette {
    pub(crate) fn new(app: DiagramApp) -> Self {
        Self {
            element: PageElement::new(Locator::new(
                app,
                Selector::has_class(COMMAND_PALETTE_CLASS),
            )),
        }
    }

    /// Open the palette and wait for it to render
    pub async fn open(&self) -> TrazarResult<()> {
        self.app().driver().press_key("Control+Space").await?;
        self.element.wait_for(ElementState::Visible).await
    }

    /// Whether the palette is currently open
    pub async fn is_open(&self) -> TrazarResult<bool> {
        self.element.is_visible().await
    }

    /// All currently offered suggestions, in display order
    pub async fn suggestions(&self) -> TrazarResult<Vec<String>> {
        self.element
            .locator()
            .child(Selector::has_class(SUGGESTION_CLASS))
            .texts()
            .await
    }

    /// Type a query and return the suggestions narrowed to those starting
    /// with it
    pub async fn search(&self, query: &str) -> TrazarResult<Vec<String>> {
        let input = self.element.locator().child(Selector::tag("input"));
        input.type_text(query).await?;
        Ok(self
            .suggestions()
            .await?
            .into_iter()
            .filter(|suggestion| suggestion.starts_with(query))
            .collect())
    }

    /// Confirm the highlighted suggestion
    pub async fn confirm(&self) -> TrazarResult<()> {
        self.app().driver().press_key("Enter").await
    }
}

impl Locateable for CommandPalette {
    fn locator(&self) -> &Locator {
        self.element.locator()
    }
}

/// The context menu, available only on hosting contexts that support it
#[derive(Debug, Clone)]
pub struct ContextMenu {
    element: PageElement,
}

impl ContextMenu {
    pub(crate) fn new(app: DiagramApp) -> Self {
        Self {
            element: PageElement::new(Locator::new(
                app,
                Selector::has_class(CONTEXT_MENU_CLASS),
            )),
        }
    }

    /// Open the menu on an element and wait for it to render
    pub async fn open_for<E: Locateable + ?Sized>(&self, element: &E) -> TrazarResult<()> {
        element.locator().context_click().await?;
        self.element.wait_for(ElementState::Visible).await
    }

    /// Click a menu item by its visible label
    pub async fn select_item(&self, label: &str) -> TrazarResult<()> {
        self.element
            .locator()
            .child(Selector::has_class(MENU_ITEM_CLASS).with_text(label))
            .click()
            .await
    }
}

impl Locateable for ContextMenu {
    fn locator(&self) -> &Locator {
        self.element.locator()
    }
}
