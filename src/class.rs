//! Window classes: named, singly-inherited bundles of default handlers.
//!
//! Inheritance is fixed when a class is registered (the parent must already
//! exist, so the graph is acyclic by construction). The registry keeps a
//! resolved `(class, kind) -> owning class` table that is rebuilt whenever a
//! class or class handler is added, so dispatch never walks the lineage.

use std::collections::HashMap;

use crate::error::{Result, WmError};
use crate::message::{Handler, HandlerChain, HandlerId, MessageKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    /// The built-in `window` class every other class descends from.
    pub const BASE: ClassId = ClassId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

pub const BASE_CLASS_NAME: &str = "window";

#[derive(Debug)]
struct Class {
    name: String,
    parent: Option<ClassId>,
    /// Self first, then ancestors nearest first.
    lineage: Vec<ClassId>,
    handlers: HashMap<MessageKind, HandlerChain>,
}

#[derive(Debug)]
pub struct ClassRegistry {
    classes: Vec<Class>,
    by_name: HashMap<String, ClassId>,
    resolved: HashMap<(ClassId, MessageKind), ClassId>,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    pub fn new() -> Self {
        let base = Class {
            name: BASE_CLASS_NAME.to_string(),
            parent: None,
            lineage: vec![ClassId::BASE],
            handlers: HashMap::new(),
        };
        let mut by_name = HashMap::new();
        by_name.insert(BASE_CLASS_NAME.to_string(), ClassId::BASE);
        Self {
            classes: vec![base],
            by_name,
            resolved: HashMap::new(),
        }
    }

    /// Register `name` inheriting from `parent` (the base class when `None`).
    /// Registering an existing name returns the existing class unchanged.
    pub fn register(&mut self, name: &str, parent: Option<&str>) -> Result<ClassId> {
        if let Some(existing) = self.by_name.get(name) {
            return Ok(*existing);
        }
        let parent_id = match parent {
            Some(parent) => self
                .lookup(parent)
                .ok_or_else(|| WmError::UnknownClass(parent.to_string()))?,
            None => ClassId::BASE,
        };
        let id = ClassId(self.classes.len() as u32);
        let mut lineage = vec![id];
        lineage.extend_from_slice(&self.classes[parent_id.index()].lineage);
        self.classes.push(Class {
            name: name.to_string(),
            parent: Some(parent_id),
            lineage,
            handlers: HashMap::new(),
        });
        self.by_name.insert(name.to_string(), id);
        self.rebuild();
        tracing::debug!(class = name, parent = ?parent, "registered class");
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: ClassId) -> Option<&str> {
        self.classes.get(id.index()).map(|class| class.name.as_str())
    }

    pub fn parent(&self, id: ClassId) -> Option<ClassId> {
        self.classes.get(id.index()).and_then(|class| class.parent)
    }

    /// `id` followed by its ancestors, nearest first.
    pub fn lineage(&self, id: ClassId) -> &[ClassId] {
        self.classes
            .get(id.index())
            .map(|class| class.lineage.as_slice())
            .unwrap_or(&[])
    }

    pub fn add_handler(
        &mut self,
        class: ClassId,
        kind: MessageKind,
        handler: Handler,
    ) -> Result<HandlerId> {
        let entry = self
            .classes
            .get_mut(class.index())
            .ok_or_else(|| WmError::UnknownClass(format!("#{}", class.0)))?;
        let id = entry.handlers.entry(kind).or_default().push_back(handler);
        self.rebuild();
        Ok(id)
    }

    /// Register a handler by message name, as the widget layer does.
    pub fn add_handler_by_name(
        &mut self,
        class: &str,
        message: &str,
        handler: Handler,
    ) -> Result<HandlerId> {
        let class_id = self
            .lookup(class)
            .ok_or_else(|| WmError::UnknownClass(class.to_string()))?;
        let kind: MessageKind = message.parse()?;
        self.add_handler(class_id, kind, handler)
    }

    pub fn remove_handler(&mut self, class: ClassId, kind: MessageKind, id: HandlerId) -> bool {
        let removed = self
            .classes
            .get_mut(class.index())
            .and_then(|entry| entry.handlers.get_mut(&kind))
            .is_some_and(|chain| chain.remove(id));
        if removed {
            self.rebuild();
        }
        removed
    }

    /// Nearest class in the lineage of `class` with handlers for `kind`.
    pub fn resolve_owner(&self, class: ClassId, kind: MessageKind) -> Option<ClassId> {
        self.resolved.get(&(class, kind)).copied()
    }

    pub(crate) fn resolve(&self, class: ClassId, kind: MessageKind) -> Option<&HandlerChain> {
        let owner = self.resolve_owner(class, kind)?;
        self.classes[owner.index()].handlers.get(&kind)
    }

    fn rebuild(&mut self) {
        self.resolved.clear();
        let kinds = MessageKind::all();
        for (index, class) in self.classes.iter().enumerate() {
            for kind in &kinds {
                let owner = class.lineage.iter().find(|owner| {
                    self.classes[owner.index()]
                        .handlers
                        .get(kind)
                        .is_some_and(|chain| !chain.is_empty())
                });
                if let Some(owner) = owner {
                    self.resolved.insert((ClassId(index as u32), *kind), *owner);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::HandlerResult;

    fn noop() -> Handler {
        Handler::on_window(|_, _| HandlerResult::Ok)
    }

    #[test]
    fn registration_is_deduplicated_by_name() {
        let mut reg = ClassRegistry::new();
        let a = reg.register("button", None).unwrap();
        let b = reg.register("button", Some("button")).unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.parent(a), Some(ClassId::BASE));
    }

    #[test]
    fn unknown_parent_is_an_error() {
        let mut reg = ClassRegistry::new();
        let err = reg.register("child", Some("missing")).unwrap_err();
        assert!(matches!(err, WmError::UnknownClass(name) if name == "missing"));
    }

    #[test]
    fn nearest_class_wins_resolution() {
        let mut reg = ClassRegistry::new();
        let frame = reg.register("frame", None).unwrap();
        let dialog = reg.register("dialog", Some("frame")).unwrap();
        reg.add_handler(ClassId::BASE, MessageKind::Display, noop())
            .unwrap();
        reg.add_handler(frame, MessageKind::KeyDown, noop()).unwrap();

        assert_eq!(reg.lineage(dialog), &[dialog, frame, ClassId::BASE]);
        assert_eq!(
            reg.resolve_owner(dialog, MessageKind::KeyDown),
            Some(frame)
        );
        assert_eq!(
            reg.resolve_owner(dialog, MessageKind::Display),
            Some(ClassId::BASE)
        );
        assert_eq!(reg.resolve_owner(dialog, MessageKind::Close), None);

        let own = reg
            .add_handler_by_name("dialog", "key_down", noop())
            .unwrap();
        assert_eq!(
            reg.resolve_owner(dialog, MessageKind::KeyDown),
            Some(dialog)
        );
        assert!(reg.remove_handler(dialog, MessageKind::KeyDown, own));
        assert_eq!(
            reg.resolve_owner(dialog, MessageKind::KeyDown),
            Some(frame)
        );
    }

    #[test]
    fn handler_by_unknown_message_name_fails() {
        let mut reg = ClassRegistry::new();
        let err = reg
            .add_handler_by_name(BASE_CLASS_NAME, "repaint", noop())
            .unwrap_err();
        assert!(matches!(err, WmError::UnknownMessage(_)));
    }
}
