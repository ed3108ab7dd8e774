use std::collections::HashSet;

use crate::builder::protocol::InitTables;
use crate::foundation::error::{VgcError, VgcResult};
use crate::model::ids::{FloatListId, GradientId, ImageId, StringId};
use crate::model::paint::{Gradient, PaintAttrs};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Fresh,
    Initialized,
    Tree,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    Group { export: Option<StringId> },
    Mask,
    MaskContent,
}

/// Call-order and reference checker shared by every [`super::ImageBuilder`] implementation.
///
/// Backends call the matching `on_*` method first and only mutate their own state when it
/// succeeds.
#[derive(Debug)]
pub(crate) struct NestingTracker {
    phase: Phase,
    scopes: Vec<Scope>,
    exported: HashSet<StringId>,
    images: usize,
    strings: usize,
    float_lists: usize,
}

impl Default for NestingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl NestingTracker {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Fresh,
            scopes: Vec::new(),
            exported: HashSet::new(),
            images: 0,
            strings: 0,
            float_lists: 0,
        }
    }

    pub(crate) fn on_init(&mut self, tables: &InitTables) -> VgcResult<()> {
        self.on_init_counts(
            tables.images.len(),
            tables.strings.len(),
            tables.float_lists.len(),
        )
    }

    pub(crate) fn on_init_counts(
        &mut self,
        images: usize,
        strings: usize,
        float_lists: usize,
    ) -> VgcResult<()> {
        if self.phase != Phase::Fresh {
            return Err(VgcError::format("init called twice"));
        }
        self.images = images;
        self.strings = strings;
        self.float_lists = float_lists;
        self.phase = Phase::Initialized;
        Ok(())
    }

    pub(crate) fn on_document(&mut self) -> VgcResult<()> {
        match self.phase {
            Phase::Initialized => {
                self.phase = Phase::Tree;
                Ok(())
            }
            Phase::Fresh => Err(VgcError::format("document before init")),
            Phase::Tree => Err(VgcError::format("document after tree calls")),
        }
    }

    fn enter_tree(&mut self, op: &str) -> VgcResult<()> {
        if self.phase == Phase::Fresh {
            return Err(VgcError::format(format!("{op} before init")));
        }
        self.phase = Phase::Tree;
        Ok(())
    }

    pub(crate) fn on_gradient(&mut self, g: &Gradient) -> VgcResult<()> {
        self.enter_tree("gradient")?;
        self.check_float_list(g.offsets)
    }

    pub(crate) fn on_begin_group(&mut self, export: Option<StringId>) -> VgcResult<()> {
        self.enter_tree("begin_group")?;
        if let Some(id) = export {
            self.check_string(id)?;
            if self.exported.contains(&id) || self.is_open_export(id) {
                return Err(VgcError::structural(format!("duplicate export id {}", id.0)));
            }
        }
        self.scopes.push(Scope::Group { export });
        Ok(())
    }

    pub(crate) fn on_end_group(&mut self) -> VgcResult<Option<StringId>> {
        match self.scopes.last() {
            Some(Scope::Group { export }) => {
                let export = *export;
                self.scopes.pop();
                if let Some(id) = export {
                    self.exported.insert(id);
                }
                Ok(export)
            }
            Some(_) => Err(VgcError::format("end_group inside an open mask")),
            None => Err(VgcError::format("end_group without begin_group")),
        }
    }

    pub(crate) fn on_clip(&mut self) -> VgcResult<()> {
        self.enter_tree("clip_path")
    }

    pub(crate) fn on_begin_mask(&mut self) -> VgcResult<()> {
        self.enter_tree("begin_mask")?;
        self.scopes.push(Scope::Mask);
        Ok(())
    }

    pub(crate) fn on_mask_content(&mut self) -> VgcResult<()> {
        match self.scopes.last_mut() {
            Some(s @ Scope::Mask) => {
                *s = Scope::MaskContent;
                Ok(())
            }
            _ => Err(VgcError::format("mask_content without begin_mask")),
        }
    }

    pub(crate) fn on_end_mask(&mut self) -> VgcResult<()> {
        match self.scopes.last() {
            Some(Scope::MaskContent) => {
                self.scopes.pop();
                Ok(())
            }
            Some(Scope::Mask) => Err(VgcError::format("end_mask before mask_content")),
            _ => Err(VgcError::format("end_mask without begin_mask")),
        }
    }

    pub(crate) fn on_leaf(&mut self, op: &str, paint: &PaintAttrs, gradients: usize) -> VgcResult<()> {
        self.enter_tree(op)?;
        self.check_paint(paint, gradients)
    }

    pub(crate) fn on_image(&mut self, id: ImageId) -> VgcResult<()> {
        self.enter_tree("image")?;
        check_range("image", id.0, self.images)
    }

    pub(crate) fn on_text(
        &mut self,
        text: StringId,
        family: Option<StringId>,
        paint: &PaintAttrs,
        gradients: usize,
    ) -> VgcResult<()> {
        self.on_leaf("text", paint, gradients)?;
        self.check_string(text)?;
        family.map_or(Ok(()), |f| self.check_string(f))
    }

    pub(crate) fn on_use(&mut self, target: StringId) -> VgcResult<()> {
        self.enter_tree("use")?;
        self.check_string(target)?;
        if self.is_open_export(target) {
            return Err(VgcError::structural(format!(
                "use of export id {} inside its own group",
                target.0
            )));
        }
        if !self.exported.contains(&target) {
            return Err(VgcError::structural(format!(
                "use of unresolved export id {}",
                target.0
            )));
        }
        Ok(())
    }

    pub(crate) fn on_finish(&self) -> VgcResult<()> {
        if self.phase == Phase::Fresh {
            return Err(VgcError::format("finish before init"));
        }
        match self.scopes.last() {
            None => Ok(()),
            Some(Scope::Group { .. }) => Err(VgcError::format("unclosed group at finish")),
            Some(_) => Err(VgcError::format("unclosed mask at finish")),
        }
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub(crate) fn check_paint(&self, paint: &PaintAttrs, gradients: usize) -> VgcResult<()> {
        for id in paint.gradients() {
            check_gradient(id, gradients)?;
        }
        if let Some(dash) = paint.stroke.and_then(|s| s.dash) {
            self.check_float_list(dash)?;
        }
        Ok(())
    }

    fn check_string(&self, id: StringId) -> VgcResult<()> {
        check_range("string", id.0, self.strings)
    }

    fn check_float_list(&self, id: FloatListId) -> VgcResult<()> {
        check_range("float list", id.0, self.float_lists)
    }

    fn is_open_export(&self, id: StringId) -> bool {
        self.scopes
            .iter()
            .any(|s| matches!(s, Scope::Group { export: Some(e) } if *e == id))
    }
}

pub(crate) fn check_gradient(id: GradientId, gradients: usize) -> VgcResult<()> {
    check_range("gradient", id.0, gradients)
}

fn check_range(kind: &str, index: u32, len: usize) -> VgcResult<()> {
    if (index as usize) < len {
        Ok(())
    } else {
        Err(crate::model::primitive::missing_index(kind, index))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/builder/check.rs"]
mod tests;
