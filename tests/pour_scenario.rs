use bottlepour::{Bottle, BottleConfig, BottleEvent, BottleId, Rgb, Shelf};

const DT: f32 = 1.0 / 60.0;
const RED: Rgb = Rgb::new(255, 59, 48);
const TEAL: Rgb = Rgb::new(48, 176, 199);

fn shelf_of(n: usize, slots: usize) -> Shelf {
    let mut shelf = Shelf::new();
    for _ in 0..n {
        shelf.add(Bottle::new(BottleConfig::new(slots, 24.0, 64.0)).unwrap());
    }
    shelf.layout(n as f32 * 48.0, 6.0);
    shelf
}

fn run_until_idle(shelf: &mut Shelf) -> Vec<(BottleId, BottleEvent)> {
    let mut events = Vec::new();
    for _ in 0..2000 {
        events.extend(shelf.update(DT).unwrap());
        if !shelf.is_animating() {
            return events;
        }
    }
    panic!("shelf never settled");
}

#[test]
fn red_slot_moves_between_bottles() {
    let (a, b) = (BottleId(0), BottleId(1));
    let mut shelf = shelf_of(2, 8);

    assert!(shelf.fill(a, RED).unwrap());
    run_until_idle(&mut shelf);
    let src = shelf.get(a).unwrap();
    assert_eq!(src.current_slots(), 1);
    assert_eq!(src.current_percent(), 0.125);
    assert_eq!(src.palette().band_color(0), RED.opaque());

    assert!(shelf.pour(a, Some(b)).unwrap());
    let events = run_until_idle(&mut shelf);

    let src = shelf.get(a).unwrap();
    let dst = shelf.get(b).unwrap();
    assert_eq!(src.current_slots(), 0);
    assert!(src.palette().band_color(0).is_transparent());
    assert_eq!(dst.current_slots(), 1);
    assert_eq!(dst.palette().band_color(0), RED.opaque());
    assert!(events.contains(&(
        a,
        BottleEvent::PourFinished {
            color: RED,
            target: Some(b)
        }
    )));
}

#[test]
fn source_keeps_its_slot_until_the_pour_completes() {
    let (a, b) = (BottleId(0), BottleId(1));
    let mut shelf = shelf_of(2, 4);
    shelf.fill(a, RED).unwrap();
    run_until_idle(&mut shelf);
    shelf.fill(a, TEAL).unwrap();
    run_until_idle(&mut shelf);

    shelf.pour(a, Some(b)).unwrap();
    let mut frames = 0;
    while shelf.get(a).unwrap().is_animating() {
        assert_eq!(shelf.get(a).unwrap().current_slots(), 2);
        assert_eq!(shelf.get(a).unwrap().top_color(), Some(TEAL));
        shelf.update(DT).unwrap();
        frames += 1;
        assert!(frames < 1000);
    }
    assert_eq!(shelf.get(a).unwrap().current_slots(), 1);
    assert_eq!(shelf.get(a).unwrap().top_color(), Some(RED));
}

#[test]
fn particles_land_on_the_receiving_surface() {
    let (a, b) = (BottleId(0), BottleId(1));
    let mut shelf = shelf_of(2, 4);
    for _ in 0..3 {
        shelf.fill(b, TEAL).unwrap();
        run_until_idle(&mut shelf);
    }
    shelf.fill(a, RED).unwrap();
    run_until_idle(&mut shelf);

    shelf.pour(a, Some(b)).unwrap();
    let mut seen = 0;
    for _ in 0..200 {
        shelf.update(DT).unwrap();
        let floor = shelf.get(b).unwrap().surface_y();
        for p in shelf.get(a).unwrap().particles() {
            seen += 1;
            assert!(p.pos.y > floor - 10.0, "particle at {} below {}", p.pos.y, floor);
        }
    }
    assert!(seen > 0);
}

#[test]
fn adds_and_removes_round_trip() {
    let id = BottleId(0);
    let mut shelf = shelf_of(1, 5);
    for _ in 0..5 {
        assert!(shelf.fill(id, TEAL).unwrap());
        run_until_idle(&mut shelf);
    }
    assert!(shelf.get(id).unwrap().is_full());
    assert!(!shelf.fill(id, RED).unwrap());

    for _ in 0..5 {
        assert!(shelf.remove_top(id).unwrap());
        run_until_idle(&mut shelf);
    }
    let bottle = shelf.get(id).unwrap();
    assert!(bottle.is_empty());
    assert!(bottle.slot_colors().iter().all(Option::is_none));
    assert!(!shelf.remove_top(id).unwrap());
}

#[test]
fn busy_target_refuses_a_second_pour() {
    let (a, b, c) = (BottleId(0), BottleId(1), BottleId(2));
    let mut shelf = shelf_of(3, 4);
    shelf.fill(a, RED).unwrap();
    shelf.fill(c, TEAL).unwrap();
    run_until_idle(&mut shelf);

    assert!(shelf.pour(a, Some(b)).unwrap());
    assert!(!shelf.pour(c, Some(b)).unwrap());
    assert!(!shelf.get(c).unwrap().is_animating());
    run_until_idle(&mut shelf);
    assert_eq!(shelf.get(b).unwrap().current_slots(), 1);
    assert_eq!(shelf.get(c).unwrap().current_slots(), 1);
}
