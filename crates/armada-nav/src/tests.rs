#[cfg(test)]
mod tests {
    use armada_core::enums::{DockingState, Posture};
    use armada_core::scratch::CycleScratch;
    use armada_core::snapshot::{ResourceNode, Unit, WorldSnapshot};
    use armada_core::target::TargetRef;
    use armada_core::types::{velocity_from, PlannedMove, Position};

    use crate::airspace::{Airspace, ObstacleRef, Scan};
    use crate::collision::*;
    use crate::navigator::*;

    const ME: u32 = 0;
    const THEM: u32 = 1;

    fn unit(id: u32, owner: u32, x: f64, y: f64) -> Unit {
        Unit {
            id,
            owner,
            position: Position::new(x, y),
            radius: 0.5,
            health: 255.0,
            docking: DockingState::Undocked,
            docked_node: None,
            weapon_cooldown: false,
        }
    }

    fn docked(mut u: Unit, node: u32) -> Unit {
        u.docking = DockingState::Docked;
        u.docked_node = Some(node);
        u
    }

    fn node(id: u32, x: f64, y: f64, radius: f64) -> ResourceNode {
        ResourceNode {
            id,
            position: Position::new(x, y),
            radius,
            health: 1000.0,
            docking_slots: 2,
            owner: None,
            docked_units: vec![],
            remaining_production: 100.0,
        }
    }

    fn world(units: Vec<Unit>, nodes: Vec<ResourceNode>) -> WorldSnapshot {
        WorldSnapshot {
            turn: 10,
            width: 240.0,
            height: 160.0,
            my_id: ME,
            posture: Posture::Normal,
            deserting: false,
            focus_target: None,
            units,
            nodes,
        }
    }

    fn scan<'s>(origin: Position, heading: f64, members: &'s [u32], skip: &'s [ObstacleRef]) -> Scan<'s> {
        Scan {
            origin,
            radius: 0.5,
            velocity: velocity_from(7.0, heading),
            fudge: 0.2,
            members,
            skip,
            avoid_hostiles: false,
        }
    }

    // --- Collision predictor ---

    #[test]
    fn test_diverging_paths_do_not_collide() {
        let obstacle = Obstacle::stationary(Position::new(0.0, 20.0), 0.5);
        let hit = predict_with_velocity(&Position::new(0.0, 0.0), 0.5, velocity_from(7.0, 0.0), &obstacle, 0.2);
        assert!(hit.is_none());
    }

    #[test]
    fn test_head_on_collision_reports_first_contact() {
        // Combined radius 1.0, separation 10, closing at 14 per cycle: the
        // edges touch at 9/14, the centres would meet at 10/14.
        let obstacle = Obstacle::moving(Position::new(10.0, 0.0), 0.5, Position::new(3.0, 0.0));
        let time = predict_with_velocity(&Position::new(0.0, 0.0), 0.5, velocity_from(7.0, 0.0), &obstacle, 0.0)
            .expect("head-on paths must collide");
        assert!((time - 9.0 / 14.0).abs() < 1e-9, "time was {time}");
    }

    #[test]
    fn test_receding_obstacle_is_clear() {
        let obstacle = Obstacle::stationary(Position::new(-3.0, 0.0), 0.5);
        let hit = predict(&Position::new(0.0, 0.0), 0.5, &Position::new(10.0, 0.0), &obstacle, 0.2);
        assert!(hit.is_none());
    }

    #[test]
    fn test_equal_motion_uses_static_distance() {
        let origin = Position::new(0.0, 0.0);
        let close = Obstacle::moving(Position::new(0.8, 0.0), 0.5, Position::new(7.8, 0.0));
        let far = Obstacle::moving(Position::new(5.0, 0.0), 0.5, Position::new(12.0, 0.0));
        let v = velocity_from(7.0, 0.0);
        assert_eq!(predict_with_velocity(&origin, 0.5, v, &close, 0.0), Some(0.0));
        assert_eq!(predict_with_velocity(&origin, 0.5, v, &far, 0.0), None);
    }

    #[test]
    fn test_short_move_stops_before_obstacle() {
        // Target 3 away: the mover only travels 3, never reaching the obstacle at 10.
        let obstacle = Obstacle::stationary(Position::new(10.0, 0.0), 2.0);
        let hit = predict(&Position::new(0.0, 0.0), 0.5, &Position::new(3.0, 0.0), &obstacle, 0.2);
        assert!(hit.is_none());
    }

    #[test]
    fn test_velocity_toward_caps_speed() {
        let v = velocity_toward(&Position::new(0.0, 0.0), &Position::new(30.0, 40.0));
        assert!((v.length() - 7.0).abs() < 1e-9);
        let v = velocity_toward(&Position::new(0.0, 0.0), &Position::new(3.0, 4.0));
        assert!((v.length() - 5.0).abs() < 1e-9);
        assert_eq!(velocity_toward(&Position::new(1.0, 1.0), &Position::new(1.0, 1.0)).length(), 0.0);
    }

    #[test]
    fn test_crossing_point_offsets_towards_mover() {
        let p = crossing_point(
            &Position::new(0.0, 0.0),
            &Position::new(10.0, 0.0),
            &Position::new(5.0, -5.0),
            &Position::new(5.0, 5.0),
            1.3,
        );
        assert!((p.x - 3.7).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn test_crossing_point_parallel_returns_origin() {
        let origin = Position::new(1.0, 1.0);
        let p = crossing_point(
            &origin,
            &Position::new(10.0, 1.0),
            &Position::new(0.0, 5.0),
            &Position::new(10.0, 5.0),
            1.3,
        );
        assert_eq!(p, origin);
    }

    // --- Airspace ---

    #[test]
    fn test_scan_finds_earliest_obstacle() {
        let w = world(vec![unit(1, ME, 50.0, 50.0)], vec![node(1, 58.0, 50.0, 2.0), node(2, 54.0, 50.0, 1.0)]);
        let scratch = CycleScratch::new(&w);
        let air = Airspace::new(&w, &scratch);
        let contact = air
            .closest_obstacle(&scan(Position::new(50.0, 50.0), 0.0, &[1], &[]))
            .unwrap();
        assert_eq!(contact.obstacle, ObstacleRef::Node(2));

        let skip = [ObstacleRef::Node(2)];
        let contact = air
            .closest_obstacle(&scan(Position::new(50.0, 50.0), 0.0, &[1], &skip))
            .unwrap();
        assert_eq!(contact.obstacle, ObstacleRef::Node(1));
    }

    #[test]
    fn test_scan_ignores_undocked_hostiles_unless_asked() {
        let w = world(vec![unit(1, ME, 50.0, 50.0), unit(2, THEM, 54.0, 50.0)], vec![]);
        let scratch = CycleScratch::new(&w);
        let air = Airspace::new(&w, &scratch);
        let mut s = scan(Position::new(50.0, 50.0), 0.0, &[1], &[]);
        assert!(air.closest_obstacle(&s).is_none());
        s.avoid_hostiles = true;
        assert_eq!(air.closest_obstacle(&s).unwrap().obstacle, ObstacleRef::Unit(2));
    }

    #[test]
    fn test_scan_skips_members() {
        let w = world(vec![unit(1, ME, 50.0, 50.0), unit(2, ME, 54.0, 50.0)], vec![]);
        let scratch = CycleScratch::new(&w);
        let air = Airspace::new(&w, &scratch);
        assert!(air
            .closest_obstacle(&scan(Position::new(50.0, 50.0), 0.0, &[1, 2], &[]))
            .is_none());
        let contact = air
            .closest_obstacle(&scan(Position::new(50.0, 50.0), 0.0, &[1], &[]))
            .unwrap();
        assert!(contact.friendly);
        assert!(!contact.is_moving_friend());
    }

    #[test]
    fn test_docked_friend_tether_blocks() {
        // Friend docked at (50, 58) on a node at (50, 50); the path crosses
        // the gap between them without touching either body.
        let w = world(
            vec![unit(1, ME, 46.5, 56.5), docked(unit(2, ME, 50.0, 58.0), 9)],
            vec![node(9, 50.0, 50.0, 5.0)],
        );
        let scratch = CycleScratch::new(&w);
        let air = Airspace::new(&w, &scratch);
        let contact = air
            .closest_obstacle(&scan(Position::new(46.5, 56.5), 0.0, &[1], &[]))
            .unwrap();
        assert_eq!(contact.obstacle, ObstacleRef::Unit(2));
        assert_eq!(contact.docked_node, Some(9));
    }

    #[test]
    fn test_moving_friend_uses_planned_move() {
        let w = world(vec![unit(1, ME, 50.0, 50.0), unit(2, ME, 57.0, 50.0)], vec![]);
        let mut scratch = CycleScratch::new(&w);
        scratch.get_mut(2).unwrap().planned = Some(PlannedMove::from_origin(Position::new(57.0, 50.0), 7, 0));
        let air = Airspace::new(&w, &scratch);
        // Both heading east at 7: the gap never closes.
        assert!(air
            .closest_obstacle(&scan(Position::new(50.0, 50.0), 0.0, &[1], &[]))
            .is_none());
    }

    // --- Navigator ---

    fn solo(position: Position, id: &[u32]) -> Mover<'_> {
        Mover::unit(position, 0.5, id)
    }

    #[test]
    fn test_arrival_returns_none_unless_forced() {
        let w = world(vec![unit(1, ME, 50.0, 50.0)], vec![]);
        let scratch = CycleScratch::new(&w);
        let nav = Navigator::new(&w, &scratch);
        let goal = Goal::point(Position::new(50.5, 50.0));
        let mover = solo(Position::new(50.0, 50.0), &[1]);
        assert!(nav.navigate(&mover, &goal, &NavOptions::default()).is_none());
        let forced = NavOptions {
            force_zero: true,
            ..Default::default()
        };
        assert_eq!(nav.navigate(&mover, &goal, &forced), Some(Course::hold()));
    }

    #[test]
    fn test_node_standoff_limits_speed() {
        let w = world(vec![unit(1, ME, 50.0, 50.0)], vec![node(3, 60.0, 50.0, 5.0)]);
        let scratch = CycleScratch::new(&w);
        let nav = Navigator::new(&w, &scratch);
        let goal = Goal::from_target(TargetRef::Node(3), &w).unwrap();
        let course = nav
            .navigate(&solo(Position::new(50.0, 50.0), &[1]), &goal, &NavOptions::default())
            .unwrap();
        assert_eq!(course, Course { speed: 4, heading: 0 });
    }

    #[test]
    fn test_docked_hostile_approached_from_far_side() {
        let w = world(
            vec![unit(1, ME, 74.0, 30.0), docked(unit(2, THEM, 74.0, 50.0), 5)],
            vec![node(5, 80.0, 50.0, 5.0)],
        );
        let scratch = CycleScratch::new(&w);
        let nav = Navigator::new(&w, &scratch);
        let goal = Goal::from_target(TargetRef::Hostile(2), &w).unwrap();
        assert!(matches!(goal.kind, GoalKind::Hostile { docked_node: Some(5), .. }));
        let course = nav
            .navigate(&solo(Position::new(74.0, 30.0), &[1]), &goal, &NavOptions::default())
            .unwrap();
        assert_eq!(course, Course { speed: 7, heading: 96 });
    }

    #[test]
    fn test_deflection_clears_static_obstacle() {
        let origin = Position::new(50.0, 50.0);
        for (offset, radius) in [(10.0, 2.0), (6.0, 2.0)] {
            let w = world(vec![unit(1, ME, 50.0, 50.0)], vec![node(4, 50.0 + offset, 50.0, radius)]);
            let scratch = CycleScratch::new(&w);
            let nav = Navigator::new(&w, &scratch);
            let goal = Goal::point(Position::new(80.0, 50.0));
            let course = nav
                .navigate(&solo(origin, &[1]), &goal, &NavOptions::default())
                .unwrap();
            assert!(course.speed > 0);

            let obstacle = Obstacle::stationary(Position::new(50.0 + offset, 50.0), radius);
            let v = velocity_from(course.speed as f64, course.heading as f64);
            assert!(predict_with_velocity(&origin, 0.5, v, &obstacle, 0.2).is_none());
        }
    }

    #[test]
    fn test_close_obstacle_forces_deflection() {
        let w = world(vec![unit(1, ME, 50.0, 50.0)], vec![node(4, 56.0, 50.0, 2.0)]);
        let scratch = CycleScratch::new(&w);
        let nav = Navigator::new(&w, &scratch);
        let course = nav
            .navigate(
                &solo(Position::new(50.0, 50.0), &[1]),
                &Goal::point(Position::new(80.0, 50.0)),
                &NavOptions::default(),
            )
            .unwrap();
        assert_eq!(course, Course { speed: 7, heading: 27 });
    }

    #[test]
    fn test_second_conflict_slows_short_of_obstacle() {
        // Going round the node ahead runs into a second node, and going round
        // that one swings back into the first: the mover slows instead.
        let origin = Position::new(50.0, 50.0);
        let upper = origin.offset(5.0, 30.0);
        let w = world(
            vec![unit(1, ME, 50.0, 50.0)],
            vec![node(1, 57.0, 50.0, 2.0), node(2, upper.x, upper.y, 1.5)],
        );
        let scratch = CycleScratch::new(&w);
        let nav = Navigator::new(&w, &scratch);
        let course = nav
            .navigate(
                &solo(origin, &[1]),
                &Goal::point(Position::new(80.0, 50.0)),
                &NavOptions::default(),
            )
            .unwrap();
        assert_eq!(course, Course { speed: 4, heading: 3 });

        let first = Obstacle::stationary(Position::new(57.0, 50.0), 2.0);
        let v = velocity_from(course.speed as f64, course.heading as f64);
        assert!(predict_with_velocity(&origin, 0.5, v, &first, 0.2).is_none());
    }

    #[test]
    fn test_deflection_goes_round_docked_friend_tether() {
        // The docked friend's tether hangs below it towards its node, so the
        // mover passes above the friend.
        let w = world(
            vec![unit(1, ME, 46.5, 56.5), docked(unit(2, ME, 50.0, 58.0), 9)],
            vec![node(9, 50.0, 50.0, 5.0)],
        );
        let scratch = CycleScratch::new(&w);
        let nav = Navigator::new(&w, &scratch);
        let course = nav
            .navigate(
                &solo(Position::new(46.5, 56.5), &[1]),
                &Goal::point(Position::new(80.0, 56.5)),
                &NavOptions::default(),
            )
            .unwrap();
        assert_eq!(course, Course { speed: 7, heading: 42 });
    }

    #[test]
    fn test_hostile_near_dock_is_met_in_front_of_it() {
        let w = world(
            vec![
                unit(1, ME, 30.0, 50.0),
                docked(unit(2, ME, 50.0, 50.0), 9),
                unit(5, THEM, 50.0, 70.0),
            ],
            vec![node(9, 50.0, 44.0, 3.0)],
        );
        let goal = Goal::from_target(TargetRef::Hostile(5), &w).unwrap();
        let mover = solo(Position::new(30.0, 50.0), &[1]);

        let scratch = CycleScratch::new(&w);
        let chase = Navigator::new(&w, &scratch)
            .navigate(&mover, &goal, &NavOptions::default())
            .unwrap();
        assert_eq!(chase, Course { speed: 7, heading: 45 });

        // Small fleet: aim just outside the dock on the hostile's side.
        let mut scratch = CycleScratch::new(&w);
        scratch.get_mut(5).unwrap().guarded_dock = Some(2);
        let intercept = Navigator::new(&w, &scratch)
            .navigate(&mover, &goal, &NavOptions::default())
            .unwrap();
        assert_eq!(intercept, Course { speed: 7, heading: 3 });
    }

    #[test]
    fn test_undocked_hostile_in_path_halts() {
        let w = world(vec![unit(1, ME, 50.0, 50.0), unit(2, THEM, 54.0, 50.0)], vec![]);
        let scratch = CycleScratch::new(&w);
        let nav = Navigator::new(&w, &scratch);
        let opts = NavOptions {
            avoid_hostiles: true,
            ..Default::default()
        };
        let course = nav.navigate(
            &solo(Position::new(50.0, 50.0), &[1]),
            &Goal::point(Position::new(80.0, 50.0)),
            &opts,
        );
        assert_eq!(course, Some(Course::hold()));
    }

    #[test]
    fn test_moving_friend_avoided_or_held() {
        let w = world(vec![unit(1, ME, 50.0, 50.0), unit(2, ME, 54.0, 46.5)], vec![]);
        let mut scratch = CycleScratch::new(&w);
        let planned = PlannedMove::from_origin(Position::new(54.0, 46.5), 7, 90);
        scratch.get_mut(2).unwrap().planned = Some(planned);
        let nav = Navigator::new(&w, &scratch);
        let opts = NavOptions {
            force_zero: true,
            ..Default::default()
        };
        let course = nav
            .navigate(
                &solo(Position::new(50.0, 50.0), &[1]),
                &Goal::point(Position::new(80.0, 50.0)),
                &opts,
            )
            .unwrap();
        if !course.is_hold() {
            let other = Obstacle::moving(Position::new(54.0, 46.5), 0.5, planned.end);
            let v = velocity_from(course.speed as f64, course.heading as f64);
            assert!(predict_with_velocity(&Position::new(50.0, 50.0), 0.5, v, &other, 0.2).is_none());
        }
    }

    #[test]
    fn test_corner_correction_keeps_move_in_bounds() {
        let w = world(vec![unit(1, ME, 2.0, 50.0)], vec![]);
        let scratch = CycleScratch::new(&w);
        let nav = Navigator::new(&w, &scratch);
        let course = nav
            .navigate(
                &solo(Position::new(2.0, 50.0), &[1]),
                &Goal::point(Position::new(-5.0, 50.0)),
                &NavOptions::default(),
            )
            .unwrap();
        assert_eq!(course.heading, 268);
    }

    #[test]
    fn test_standoff_by_goal_kind() {
        let w = world(vec![unit(1, ME, 50.0, 50.0), unit(2, THEM, 70.0, 50.0)], vec![]);
        let scratch = CycleScratch::new(&w);
        let nav = Navigator::new(&w, &scratch);
        let goal = Goal::from_target(TargetRef::Hostile(2), &w).unwrap();
        let mover = solo(Position::new(63.0, 50.0), &[1]);

        // Approach standoff: edge + 2 = 67.5; engage standoff: edge + 4.5 = 65.
        let approach = nav.navigate(&mover, &goal, &NavOptions::default()).unwrap();
        assert_eq!(approach.speed, 4);
        let engage = NavOptions {
            engage: true,
            ..Default::default()
        };
        let engaged = nav.navigate(&mover, &goal, &engage).unwrap();
        assert_eq!(engaged.speed, 2);
    }
}
