    use std::path::Path;

    use engine::{
        InputAction, InputEdge, InputSnapshot, MusicMode, Scene, SceneCommand, SceneWorld,
        SoundBank, SoundConfig, SoundId, Vec2, Vec3,
    };

    use super::collision::{Collider, CollisionWorld};
    use super::items::ItemSlot;
    use super::locomotion::{Locomotion, PLAYER_RADIUS};
    use super::scene::{CourtyardScene, CourtyardSettings, TickStage};

    const FIXED_DT: f32 = 1.0 / 60.0;
    const MISSING_ASSETS: &str = "/nonexistent-courtyard-assets";

    fn loaded_scene() -> (CourtyardScene, SceneWorld) {
        let settings = CourtyardSettings {
            snow_flakes: 64,
            ..CourtyardSettings::default()
        };
        let sounds = SoundBank::load(Path::new(MISSING_ASSETS), &SoundConfig::default());
        let mut scene = CourtyardScene::new(settings, sounds);
        let mut world = SceneWorld::default();
        scene.load(&mut world);
        (scene, world)
    }

    fn tick(scene: &mut CourtyardScene, world: &mut SceneWorld, input: &InputSnapshot) -> SceneCommand {
        scene.update(FIXED_DT, input, world)
    }

    fn captured() -> InputSnapshot {
        InputSnapshot::empty().with_pointer_captured(true)
    }

    fn enter_first_person(scene: &mut CourtyardScene, world: &mut SceneWorld) {
        let command = tick(
            scene,
            world,
            &InputSnapshot::empty().with_pressed(InputEdge::ToggleFirstPerson),
        );
        assert_eq!(command, SceneCommand::CapturePointer);
        assert!(scene.locomotion().is_active());
    }

    fn render(scene: &mut CourtyardScene, world: &mut SceneWorld) {
        world.begin_frame();
        scene.render(world);
    }

    /// Clicks until one bottle is finished, then waits for the refill.
    fn drink_one_bottle(scene: &mut CourtyardScene, world: &mut SceneWorld) {
        let before = scene.items().counts().get(ItemSlot::Champagne);
        let click = captured().with_pressed(InputEdge::PrimaryClick);
        let mut ticks = 0;
        while scene.items().counts().get(ItemSlot::Champagne) == before {
            tick(scene, world, &click);
            ticks += 1;
            assert!(ticks < 400, "bottle never emptied");
        }
        while scene.items().bottle().is_consumed() && !scene.intoxication().is_passed_out() {
            tick(scene, world, &captured());
            ticks += 1;
            assert!(ticks < 500, "bottle never refilled");
        }
    }

    #[test]
    fn overview_tick_skips_first_person_stages() {
        let (mut scene, mut world) = loaded_scene();
        tick(&mut scene, &mut world, &InputSnapshot::empty());
        assert_eq!(
            scene.last_tick_order(),
            &[
                TickStage::Entities,
                TickStage::Decorations,
                TickStage::Effects,
                TickStage::Intoxication,
                TickStage::CameraControls,
                TickStage::Sway,
                TickStage::Locomotion,
                TickStage::EventDispatch,
            ]
        );
    }

    #[test]
    fn first_person_tick_runs_every_stage_in_order() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        tick(&mut scene, &mut world, &captured());
        assert_eq!(
            scene.last_tick_order(),
            &[
                TickStage::Entities,
                TickStage::Decorations,
                TickStage::Effects,
                TickStage::Intoxication,
                TickStage::CameraControls,
                TickStage::Sway,
                TickStage::Locomotion,
                TickStage::PlayerBody,
                TickStage::Items,
                TickStage::EventDispatch,
            ]
        );
    }

    #[test]
    fn load_starts_music_and_places_overview_camera() {
        let (scene, world) = loaded_scene();
        assert!(scene.sounds().is_music_playing());
        assert_eq!(scene.sounds().music_mode(), MusicMode::Global);
        assert!(world.primitive_count() > 0);
        assert!(scene.collision().collider_count() > 0);

        let camera = world.camera().position;
        assert!((camera.x - 50.0).abs() < 0.01);
        assert!((camera.y - 50.0).abs() < 0.01);
        assert!((camera.z - 50.0).abs() < 0.01);
    }

    #[test]
    fn toggling_first_person_captures_and_releases_pointer() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        assert_eq!(scene.sounds().music_mode(), MusicMode::Positional);
        assert!((world.camera().position.y - 1.7).abs() < 1e-4);

        let command = tick(
            &mut scene,
            &mut world,
            &captured().with_pressed(InputEdge::ToggleFirstPerson),
        );
        assert_eq!(command, SceneCommand::ReleasePointer);
        assert!(!scene.locomotion().is_active());
        assert_eq!(scene.sounds().music_mode(), MusicMode::Global);
    }

    #[test]
    fn losing_pointer_capture_leaves_first_person_and_resets_state() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        tick(&mut scene, &mut world, &captured().with_pressed(InputEdge::Slot2));
        assert_eq!(scene.items().equipped(), Some(ItemSlot::Sparkler));
        assert!(scene.sounds().is_looping(SoundId::Sparkler));

        tick(
            &mut scene,
            &mut world,
            &InputSnapshot::empty().with_pointer_capture_lost(true),
        );
        assert!(!scene.locomotion().is_active());
        assert_eq!(scene.items().equipped(), None);
        assert!(!scene.sounds().is_looping(SoundId::Sparkler));
        assert_eq!(scene.intoxication().level(), 0);
        assert_eq!(scene.sounds().music_mode(), MusicMode::Global);
    }

    #[test]
    fn item_keys_are_ignored_in_overview() {
        let (mut scene, mut world) = loaded_scene();
        tick(
            &mut scene,
            &mut world,
            &captured()
                .with_pressed(InputEdge::Slot1)
                .with_pressed(InputEdge::PrimaryClick),
        );
        assert_eq!(scene.items().equipped(), None);
        assert_eq!(scene.sounds().play_count(SoundId::Cork), 0);
    }

    #[test]
    fn click_without_pointer_capture_does_not_use_item() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        tick(&mut scene, &mut world, &captured().with_pressed(InputEdge::Slot1));
        tick(
            &mut scene,
            &mut world,
            &InputSnapshot::empty().with_pressed(InputEdge::PrimaryClick),
        );
        assert_eq!(scene.sounds().play_count(SoundId::Cork), 0);
    }

    #[test]
    fn drinking_a_bottle_raises_intoxication() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        tick(&mut scene, &mut world, &captured().with_pressed(InputEdge::Slot1));
        assert_eq!(scene.items().equipped(), Some(ItemSlot::Champagne));

        drink_one_bottle(&mut scene, &mut world);
        assert_eq!(scene.intoxication().level(), 1);
        assert_eq!(scene.items().counts().get(ItemSlot::Champagne), 9);
        assert_eq!(scene.sounds().play_count(SoundId::Cork), 1);
        assert_eq!(scene.sounds().play_count(SoundId::Drink), 1);
        assert!(!scene.items().bottle().is_consumed());
    }

    #[test]
    fn fifth_drink_passes_out_and_freezes_the_player() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        tick(&mut scene, &mut world, &captured().with_pressed(InputEdge::Slot1));
        for _ in 0..5 {
            drink_one_bottle(&mut scene, &mut world);
        }
        assert!(scene.intoxication().is_passed_out());
        assert!(!scene.locomotion().can_move());
        assert_eq!(scene.intoxication().hallucinations().len(), 17);
        assert_eq!(scene.items().counts().get(ItemSlot::Champagne), 5);

        let position = scene.locomotion().position();
        tick(
            &mut scene,
            &mut world,
            &captured()
                .with_action_down(InputAction::MoveForward, true)
                .with_pressed(InputEdge::Slot2),
        );
        assert_eq!(scene.locomotion().position(), position);
        assert_eq!(scene.items().equipped(), Some(ItemSlot::Champagne));
        assert!(!scene.sounds().is_looping(SoundId::Footstep));

        render(&mut scene, &mut world);
        let hud = world.hud();
        assert!(hud.status.as_deref().is_some_and(|status| status.starts_with("PASSED OUT")));
        assert!(!hud.crosshair);
        assert_eq!(hud.vignette, 1.0);
    }

    #[test]
    fn waking_up_restores_movement_at_reduced_level() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        tick(&mut scene, &mut world, &captured().with_pressed(InputEdge::Slot1));
        for _ in 0..5 {
            drink_one_bottle(&mut scene, &mut world);
        }
        let mut ticks = 0;
        while scene.intoxication().is_passed_out() {
            tick(&mut scene, &mut world, &captured());
            ticks += 1;
            assert!(ticks < 700, "player never woke up");
        }
        assert!(scene.locomotion().can_move());
        assert_eq!(scene.intoxication().level(), 2);
        assert!(scene.intoxication().hallucinations().is_empty());
    }

    #[test]
    fn capture_loss_swallows_a_same_tick_reentry() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);

        let command = tick(
            &mut scene,
            &mut world,
            &InputSnapshot::empty()
                .with_pointer_capture_lost(true)
                .with_pressed(InputEdge::ToggleFirstPerson),
        );
        assert_eq!(command, SceneCommand::None);
        assert!(!scene.locomotion().is_active());
        assert_eq!(scene.sounds().music_mode(), MusicMode::Global);

        enter_first_person(&mut scene, &mut world);
    }

    #[test]
    fn leaving_first_person_clears_intoxication() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        tick(&mut scene, &mut world, &captured().with_pressed(InputEdge::Slot1));
        drink_one_bottle(&mut scene, &mut world);
        drink_one_bottle(&mut scene, &mut world);
        assert_eq!(scene.intoxication().level(), 2);

        tick(
            &mut scene,
            &mut world,
            &captured().with_pressed(InputEdge::ToggleFirstPerson),
        );
        assert_eq!(scene.intoxication().level(), 0);
        assert_eq!(scene.items().equipped(), None);
        assert_eq!(scene.items().counts().get(ItemSlot::Champagne), 8);
    }

    #[test]
    fn walking_loops_footsteps_until_the_player_stops() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        let forward = captured().with_action_down(InputAction::MoveForward, true);
        tick(&mut scene, &mut world, &forward);
        assert!(scene.sounds().is_looping(SoundId::Footstep));
        tick(&mut scene, &mut world, &forward);
        assert!(scene.sounds().is_looping(SoundId::Footstep));

        tick(&mut scene, &mut world, &captured());
        assert!(!scene.sounds().is_looping(SoundId::Footstep));
    }

    #[test]
    fn storm_toggle_adds_flakes_and_wind() {
        let (mut scene, mut world) = loaded_scene();
        let storm = InputSnapshot::empty().with_pressed(InputEdge::ToggleStorm);
        tick(&mut scene, &mut world, &storm);
        assert!(scene.snow().is_storm_active());
        assert_eq!(scene.snow().flake_count(), 64 + 1_500);
        assert!(scene.sounds().is_looping(SoundId::Wind));

        tick(&mut scene, &mut world, &storm);
        assert!(!scene.snow().is_storm_active());
        assert_eq!(scene.snow().flake_count(), 64);
        assert!(!scene.sounds().is_looping(SoundId::Wind));
    }

    #[test]
    fn fireworks_show_launches_and_shows_banner() {
        let (mut scene, mut world) = loaded_scene();
        tick(
            &mut scene,
            &mut world,
            &InputSnapshot::empty().with_pressed(InputEdge::ToggleFireworks),
        );
        assert!(scene.show().is_active());
        assert!(scene.show().burst_count() >= 1);
        assert!(scene.sounds().play_count(SoundId::FireworkBoom) >= 1);

        for _ in 0..120 {
            tick(&mut scene, &mut world, &InputSnapshot::empty());
        }
        assert!(scene.show().launched() >= 2);

        render(&mut scene, &mut world);
        assert_eq!(world.hud().banner.as_deref(), Some("HAPPY NEW YEAR 2026!"));

        tick(
            &mut scene,
            &mut world,
            &InputSnapshot::empty().with_pressed(InputEdge::ToggleFireworks),
        );
        assert!(!scene.show().is_active());
        assert_eq!(scene.show().burst_count(), 0);
        render(&mut scene, &mut world);
        assert_eq!(world.hud().banner, None);
    }

    #[test]
    fn placed_firework_launches_then_explodes() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        tick(&mut scene, &mut world, &captured().with_pressed(InputEdge::Slot3));
        tick(
            &mut scene,
            &mut world,
            &captured().with_pressed(InputEdge::PrimaryClick),
        );
        assert_eq!(scene.items().placed_fireworks().len(), 1);
        assert_eq!(scene.items().counts().get(ItemSlot::Firework), 2);

        let mut ticks = 0;
        while scene.sounds().play_count(SoundId::FireworkBoom) == 0 {
            tick(&mut scene, &mut world, &captured());
            ticks += 1;
            assert!(ticks < 600, "firework never exploded");
        }
        assert_eq!(scene.sounds().play_count(SoundId::FireworkLaunch), 1);
        assert!(scene.items().placed_fireworks().is_empty());
        assert_eq!(scene.items().bursts().len(), 1);
    }

    #[test]
    fn overview_orbits_and_clamps_zoom() {
        let (mut scene, mut world) = loaded_scene();
        let start = scene.overview().azimuth;
        tick(
            &mut scene,
            &mut world,
            &InputSnapshot::empty().with_action_down(InputAction::OrbitLeft, true),
        );
        assert!((scene.overview().azimuth - (start - 0.02)).abs() < 1e-6);

        tick(
            &mut scene,
            &mut world,
            &InputSnapshot::empty().with_zoom_delta_steps(100),
        );
        assert_eq!(scene.overview().zoom, 3.0);
        tick(
            &mut scene,
            &mut world,
            &InputSnapshot::empty().with_zoom_delta_steps(-100),
        );
        assert_eq!(scene.overview().zoom, 0.5);
    }

    #[test]
    fn overview_controls_are_frozen_in_first_person() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        let before = scene.overview();
        tick(
            &mut scene,
            &mut world,
            &captured()
                .with_action_down(InputAction::OrbitRight, true)
                .with_zoom_delta_steps(3),
        );
        assert_eq!(scene.overview(), before);
    }

    #[test]
    fn mouse_look_needs_pointer_capture() {
        let (mut scene, mut world) = loaded_scene();
        enter_first_person(&mut scene, &mut world);
        tick(
            &mut scene,
            &mut world,
            &InputSnapshot::empty().with_mouse_delta(Vec2::new(100.0, 0.0)),
        );
        assert_eq!(scene.locomotion().yaw(), 0.0);

        tick(
            &mut scene,
            &mut world,
            &captured().with_mouse_delta(Vec2::new(100.0, 0.0)),
        );
        assert!((scene.locomotion().yaw() + 0.2).abs() < 1e-6);
    }

    #[test]
    fn first_person_hud_lists_inventory() {
        let (mut scene, mut world) = loaded_scene();
        render(&mut scene, &mut world);
        assert!(world.hud().slots.is_empty());
        assert!(world.hud().hint.is_some());

        enter_first_person(&mut scene, &mut world);
        tick(&mut scene, &mut world, &captured().with_pressed(InputEdge::Slot3));
        render(&mut scene, &mut world);
        let hud = world.hud();
        let labels: Vec<_> = hud.slots.iter().map(|slot| slot.label).collect();
        assert_eq!(labels, vec!["CHAMPAGNE", "SPARKLER", "FIREWORK"]);
        let counts: Vec<_> = hud.slots.iter().map(|slot| slot.count).collect();
        assert_eq!(counts, vec![10, 1, 3]);
        assert!(hud.slots[2].selected);
        assert!(hud.crosshair);
        assert_eq!(hud.meter, None);
    }

    #[test]
    fn debug_title_reports_mode_and_counts() {
        let (mut scene, mut world) = loaded_scene();
        tick(&mut scene, &mut world, &InputSnapshot::empty());
        let title = scene.debug_title(&world).expect("title");
        assert!(title.starts_with("Holiday Courtyard | Overview"));
        assert!(title.contains("Flakes 64"));
    }

    #[test]
    fn unload_stops_every_loop() {
        let (mut scene, mut world) = loaded_scene();
        tick(
            &mut scene,
            &mut world,
            &InputSnapshot::empty().with_pressed(InputEdge::ToggleStorm),
        );
        scene.unload(&mut world);
        assert!(!scene.sounds().is_looping(SoundId::Wind));
        assert!(!scene.sounds().is_music_playing());
    }

    #[test]
    fn walking_into_a_wall_slides_along_its_face() {
        let mut collision = CollisionWorld::new();
        collision.add_collider(Collider::Box {
            center: Vec2::ZERO,
            half_width: 5.0,
            half_depth: 5.0,
        });
        let boundary = 5.0 + PLAYER_RADIUS;

        let mut locomotion = Locomotion::default();
        locomotion.activate();
        locomotion.place(Vec3::new(0.0, 1.7, 15.0), -0.3);
        let forward = InputSnapshot::empty().with_action_down(InputAction::MoveForward, true);

        for _ in 0..100 {
            locomotion.update(&forward, &collision);
            assert!(locomotion.position().z >= boundary);
        }
        let stopped = locomotion.position();
        assert!(stopped.z < boundary + 0.2);

        for _ in 0..10 {
            locomotion.update(&forward, &collision);
        }
        let slid = locomotion.position();
        assert_eq!(slid.z, stopped.z);
        assert!(slid.x > stopped.x);
    }
