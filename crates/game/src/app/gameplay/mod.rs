mod collision;
mod effects;
mod entities;
mod events;
mod intoxication;
mod items;
mod locomotion;
mod player_body;
mod scene;
mod world_layout;

use engine::{Scene, SoundBank};

pub(crate) use entities::Populations;
pub(crate) use items::InventoryCounts;
pub(crate) use scene::CourtyardSettings;

pub(crate) fn build_scene(settings: CourtyardSettings, sounds: SoundBank) -> Box<dyn Scene> {
    Box::new(scene::CourtyardScene::new(settings, sounds))
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
