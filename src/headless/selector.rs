//! CSS selectors for the headless DOM.
//!
//! Parsing and matching are done by the `selectors` crate; this module only
//! teaches it how to walk the element arena.  Besides the structural
//! pseudo-classes the crate handles itself, `:checked`, `:disabled`,
//! `:enabled` and `:focus` are understood.

use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use cssparser::{CowRcStr, ParseError, Parser as CssParser, ParserInput, SourceLocation, ToCss};
use precomputed_hash::PrecomputedHash;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{
    matches_selector, ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext,
    MatchingMode, NeedsSelectorFlags, QuirksMode,
};
use selectors::parser::{ParseRelative, SelectorList as CssSelectorList, SelectorParseErrorKind};
use selectors::{NthIndexCache, OpaqueElement};

use super::{NodeId, Tree, ROOT};

/// Tags that take the `disabled` attribute.
const FORM_CONTROLS: [&str; 6] = ["button", "input", "select", "textarea", "optgroup", "option"];

/// Identifiers and attribute values inside a parsed selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CssString(String);

impl From<&str> for CssString {
    fn from(s: &str) -> Self {
        CssString(s.to_string())
    }
}

impl AsRef<str> for CssString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CssString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssString {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        cssparser::serialize_string(&self.0, dest)
    }
}

impl PrecomputedHash for CssString {
    fn precomputed_hash(&self) -> u32 {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish() as u32
    }
}

/// The headless document has no namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoNamespace;

impl ToCss for NoNamespace {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        Ok(())
    }
}

impl PrecomputedHash for NoNamespace {
    fn precomputed_hash(&self) -> u32 {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessSelectors;

impl selectors::SelectorImpl for HeadlessSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssString;
    type Identifier = CssString;
    type LocalName = CssString;
    type NamespacePrefix = CssString;
    type NamespaceUrl = NoNamespace;
    type BorrowedLocalName = str;
    type BorrowedNamespaceUrl = NoNamespace;
    type NonTSPseudoClass = PseudoClass;
    type PseudoElement = PseudoElement;
}

/// State pseudo-classes read from attributes and the focused element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    Checked,
    Disabled,
    Enabled,
    Focus,
}

impl selectors::parser::NonTSPseudoClass for PseudoClass {
    type Impl = HeadlessSelectors;

    fn is_active_or_hover(&self) -> bool {
        false
    }

    fn is_user_action_state(&self) -> bool {
        matches!(self, PseudoClass::Focus)
    }
}

impl ToCss for PseudoClass {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_str(match self {
            PseudoClass::Checked => ":checked",
            PseudoClass::Disabled => ":disabled",
            PseudoClass::Enabled => ":enabled",
            PseudoClass::Focus => ":focus",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = HeadlessSelectors;
}

impl ToCss for PseudoElement {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

struct SelectorParser;

impl<'i> selectors::parser::Parser<'i> for SelectorParser {
    type Impl = HeadlessSelectors;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<PseudoClass, ParseError<'i, SelectorParseErrorKind<'i>>> {
        match name.to_ascii_lowercase().as_str() {
            "checked" => Ok(PseudoClass::Checked),
            "disabled" => Ok(PseudoClass::Disabled),
            "enabled" => Ok(PseudoClass::Enabled),
            "focus" => Ok(PseudoClass::Focus),
            _ => Err(location
                .new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name))),
        }
    }
}

/// An element of the arena as the `selectors` crate sees it.
#[derive(Clone, Copy)]
struct HeadlessElement<'a> {
    tree: &'a Tree,
    node: NodeId,
}

impl fmt::Debug for HeadlessElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessElement")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl<'a> HeadlessElement<'a> {
    fn at(&self, node: NodeId) -> Self {
        HeadlessElement {
            tree: self.tree,
            node,
        }
    }

    fn tag(&self) -> &'a str {
        self.tree.tag(self.node)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.tree.attribute(self.node, name).is_some()
    }

    /// The parent's children, this element included.
    fn siblings(&self) -> &'a [NodeId] {
        match self.tree.parent(self.node) {
            Some(parent) => self.tree.children(parent),
            None => &[],
        }
    }

    fn position(&self) -> Option<usize> {
        self.siblings().iter().position(|node| *node == self.node)
    }

    fn is_form_control(&self) -> bool {
        FORM_CONTROLS.contains(&self.tag())
    }
}

impl selectors::Element for HeadlessElement<'_> {
    type Impl = HeadlessSelectors;

    fn opaque(&self) -> OpaqueElement {
        match self.tree.elements.get(self.node.0) {
            Some(element) => OpaqueElement::new(element),
            None => OpaqueElement::new(self.tree),
        }
    }

    fn parent_element(&self) -> Option<Self> {
        self.tree.parent(self.node).map(|parent| self.at(parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let index = self.position()?.checked_sub(1)?;
        self.siblings().get(index).map(|node| self.at(*node))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let index = self.position()? + 1;
        self.siblings().get(index).map(|node| self.at(*node))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.tree
            .children(self.node)
            .first()
            .map(|node| self.at(*node))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &str) -> bool {
        self.tag() == local_name
    }

    fn has_namespace(&self, _ns: &NoNamespace) -> bool {
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.tag() == other.tag()
    }

    fn attr_matches(
        &self,
        _ns: &NamespaceConstraint<&NoNamespace>,
        local_name: &CssString,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        self.tree
            .attribute(self.node, &local_name.0)
            .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &PseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match pc {
            PseudoClass::Checked => self.has_attribute("checked"),
            PseudoClass::Disabled => self.is_form_control() && self.has_attribute("disabled"),
            PseudoClass::Enabled => self.is_form_control() && !self.has_attribute("disabled"),
            PseudoClass::Focus => self.tree.active == Some(self.node),
        }
    }

    fn match_pseudo_element(
        &self,
        pe: &PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pe {}
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.tag(), "a" | "area") && self.has_attribute("href")
    }

    fn is_html_slot_element(&self) -> bool {
        self.tag() == "slot"
    }

    fn has_id(&self, id: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.tree
            .attribute(self.node, "id")
            .is_some_and(|value| case_sensitivity.eq(value.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.tree.attribute(self.node, "class").is_some_and(|classes| {
            classes
                .split_whitespace()
                .any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes()))
        })
    }

    fn imported_part(&self, _name: &CssString) -> Option<CssString> {
        None
    }

    fn is_part(&self, _name: &CssString) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.tree.children(self.node).is_empty()
    }

    fn is_root(&self) -> bool {
        self.node == ROOT
    }
}

/// A parsed, comma-separated selector list.
#[derive(Clone)]
pub struct SelectorList {
    source: String,
    selectors: CssSelectorList<HeadlessSelectors>,
}

impl fmt::Debug for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SelectorList").field(&self.source).finish()
    }
}

impl SelectorList {
    pub(super) fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let element = HeadlessElement { tree, node };
        let mut nth_index_cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut nth_index_cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );

        self.selectors
            .0
            .iter()
            .any(|selector| matches_selector(selector, 0, None, &element, &mut context))
    }
}

impl TryFrom<&str> for SelectorList {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut input = ParserInput::new(value);
        let mut parser = CssParser::new(&mut input);
        let selectors = CssSelectorList::<HeadlessSelectors>::parse(
            &SelectorParser,
            &mut parser,
            ParseRelative::No,
        )
        .map_err(|e| format!("Invalid selector '{}': {:?}", value, e.kind))?;

        Ok(SelectorList {
            source: value.to_string(),
            selectors,
        })
    }
}
