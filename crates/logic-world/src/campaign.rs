//! The built-in campaign: 18 levels in increasing difficulty.
//!
//! Levels 1-5 teach moves and turns, 6-7 helper functions and the blue
//! condition, 8-11 recursion, and 12-18 combine everything. Every level
//! ships a reference solution that collects all of its markers.

use std::collections::BTreeMap;

use logic_types::{Capacities, Facing, FunctionId};

use crate::catalogue::LevelCatalogue;
use crate::error::WorldError;
use crate::level::{Instructions, LevelRecord, StartRecord};

/// Number of levels in the built-in campaign.
pub const CAMPAIGN_LEN: usize = 18;

/// Helper to build a [`LevelRecord`] from authoring rows.
fn record(
    id: u32,
    rows: &[&str],
    start: (u32, u32, Facing),
    markers: &[[u32; 2]],
    slot_capacities: Capacities,
    solution: &[(FunctionId, &str)],
    (en, fr): (&str, &str),
) -> LevelRecord {
    let (row, col, facing) = start;
    LevelRecord {
        id,
        rows: u32::try_from(rows.len()).unwrap_or(u32::MAX),
        cols: rows
            .first()
            .map_or(0, |r| u32::try_from(r.len()).unwrap_or(u32::MAX)),
        grid: rows.join("\n"),
        start: StartRecord { row, col, facing },
        markers: markers.to_vec(),
        slot_capacities,
        instructions: Instructions {
            en: en.to_string(),
            fr: fr.to_string(),
        },
        reference_solution: solution
            .iter()
            .map(|(function, text)| (*function, (*text).to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// The raw records of the built-in campaign, in play order.
#[allow(clippy::too_many_lines)]
pub fn builtin_records() -> Vec<LevelRecord> {
    let mut levels = Vec::with_capacity(CAMPAIGN_LEN);

    // ---------------------------------------------------------------
    // Basics: moves and turns
    // ---------------------------------------------------------------

    levels.push(record(
        1,
        &[
            "WWWWWW",
            "WGGGGW",
            "WWWWWW",
            "WWWWWW",
            "WWWWWW",
            "WWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[1, 4]],
        [5, 0, 0, 0, 0],
        &[
            (FunctionId::F1, "F F F"),
        ],
        ("Move forward to collect the star.", "Avancez pour collecter l'étoile."),
    ));

    levels.push(record(
        2,
        &[
            "WWWWWW",
            "WWWWWW",
            "WGGGGW",
            "WWWWWW",
            "WWWWWW",
            "WWWWWW",
        ],
        (2, 4, Facing::Left),
        &[[2, 1]],
        [5, 0, 0, 0, 0],
        &[
            (FunctionId::F1, "F F F"),
        ],
        ("The direction matters.", "La direction est importante."),
    ));

    levels.push(record(
        3,
        &[
            "WWWWWW",
            "WGWWWW",
            "WGWWWW",
            "WGGGGW",
            "WWWWWW",
            "WWWWWW",
        ],
        (1, 1, Facing::Down),
        &[[3, 4]],
        [8, 0, 0, 0, 0],
        &[
            (FunctionId::F1, "F F L F F F"),
        ],
        ("Turn left to follow the path.", "Tournez à gauche pour suivre le chemin."),
    ));

    levels.push(record(
        4,
        &[
            "WWWWWW",
            "WGBGGW",
            "WGWGWW",
            "WGWGWW",
            "WWWWWW",
            "WWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[3, 3]],
        [8, 0, 0, 0, 0],
        &[
            (FunctionId::F1, "F if blue { F } R F F"),
        ],
        ("Blue logic: cross the blue tile, then turn right.", "Logique bleue : traversez la case bleue, puis tournez à droite."),
    ));

    levels.push(record(
        5,
        &[
            "WWWWWW",
            "WGGGGW",
            "WWWWGW",
            "WGGGGW",
            "WGWWWW",
            "WGGGGW",
        ],
        (1, 1, Facing::Right),
        &[[5, 4]],
        [20, 0, 0, 0, 0],
        &[
            (FunctionId::F1, "F F F R F F R F F F L F F L F F F"),
        ],
        ("The snake path needs seventeen steps.", "Le chemin en serpent nécessite dix-sept étapes."),
    ));

    // ---------------------------------------------------------------
    // Helpers and conditions
    // ---------------------------------------------------------------

    levels.push(record(
        6,
        &[
            "WWWWWWW",
            "WGGGGGW",
            "WGWWWGW",
            "WGWGGGW",
            "WGWWWWW",
            "WGGGGGW",
            "WWWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[5, 4]],
        [12, 12, 0, 0, 0],
        &[
            (FunctionId::F1, "R F2 F2 L F2 F"),
            (FunctionId::F2, "F F"),
        ],
        ("Helper functions are key.", "Les fonctions d'aide sont la clé."),
    ));

    levels.push(record(
        7,
        &[
            "WWWWWWW",
            "WBBBGWW",
            "WWWWGWW",
            "WWWWGWW",
            "WWWWGGW",
            "WWWWWGW",
            "WWWWWGW",
        ],
        (1, 1, Facing::Right),
        &[[6, 5]],
        [10, 10, 0, 0, 0],
        &[
            (FunctionId::F1, "if blue { F } R F2"),
            (FunctionId::F2, "F F F L F R F F"),
        ],
        ("While on blue, move forward.", "Tant que sur le bleu, avancez."),
    ));

    // ---------------------------------------------------------------
    // Recursion
    // ---------------------------------------------------------------

    levels.push(record(
        8,
        &[
            "WWWWWWWW",
            "WGGGGGGW",
            "WGWWWWGW",
            "WGWWWWGW",
            "WGWWWWGW",
            "WGWWWWGW",
            "WGGGGGGW",
            "WWWWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[6, 1]],
        [10, 0, 0, 0, 0],
        &[
            (FunctionId::F1, "F F F F F R F1"),
        ],
        ("Recursion: use F1 to call itself.", "Récursion : utilisez F1 pour s'appeler elle-même."),
    ));

    levels.push(record(
        9,
        &[
            "WWWWWWWW",
            "WGGGGGBW",
            "WGWWWWGW",
            "WGWWWWGW",
            "WGWWWWGW",
            "WGWWWWGW",
            "WBGGGGBW",
            "WWWWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[1, 6], [6, 6], [6, 1]],
        [10, 10, 0, 0, 0],
        &[
            (FunctionId::F1, "F if blue { F2 } F1"),
            (FunctionId::F2, "R F"),
        ],
        ("Conditional recursion.", "Récursion conditionnelle."),
    ));

    levels.push(record(
        10,
        &[
            "WWWWWWW",
            "WGGGGBW",
            "WWWWWGW",
            "WBGBWGW",
            "WGWGWGW",
            "WBGGGBW",
            "WWWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[4, 3]],
        [12, 12, 0, 0, 0],
        &[
            (FunctionId::F1, "F if blue { F2 } F1"),
            (FunctionId::F2, "R F"),
        ],
        ("Spirals are recursive.", "Les spirales sont récursives."),
    ));

    levels.push(record(
        11,
        &[
            "WWWWWWWW",
            "WGRWWWWW",
            "WWKGRWWW",
            "WWWWKGRW",
            "WWWWWWKW",
            "WWWWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[4, 6]],
        [12, 12, 12, 0, 0],
        &[
            (FunctionId::F1, "F if red { F2 } if green { F3 } F1"),
            (FunctionId::F2, "R F"),
            (FunctionId::F3, "L F"),
        ],
        ("Zig-zag using red and green.", "Zig-zag avec le rouge et le vert."),
    ));

    // ---------------------------------------------------------------
    // Composition
    // ---------------------------------------------------------------

    levels.push(record(
        12,
        &[
            "WWWWWWWW",
            "WGWWWWWW",
            "WGWWWWWW",
            "WGBBBBGW",
            "WWWWWWGW",
            "WWWWWWGW",
            "WWWWWWGW",
            "WWWWWWWW",
        ],
        (1, 1, Facing::Down),
        &[[6, 6]],
        [12, 12, 0, 0, 0],
        &[
            (FunctionId::F1, "F F L F if blue { F } R F F F"),
        ],
        ("Step by step logic.", "Logique étape par étape."),
    ));

    levels.push(record(
        13,
        &[
            "WWWWWWWW",
            "WGGGGGGW",
            "WGWWWWGW",
            "WGGGGGGW",
            "WGWWWWGW",
            "WGGGGGGW",
            "WWWWWWWW",
            "WWWWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[5, 1]],
        [15, 15, 15, 0, 0],
        &[
            (FunctionId::F1, "R F2"),
            (FunctionId::F2, "F3 F3"),
            (FunctionId::F3, "F F"),
        ],
        ("Nested calls multiply.", "Les appels imbriqués se multiplient."),
    ));

    levels.push(record(
        14,
        &[
            "WWWWWWWWWW",
            "WGGGGGGGBW",
            "WGWBBBBWGW",
            "WGWBBBBWGW",
            "WGWBBBBWGW",
            "WGWBBBBWGW",
            "WGWBBBBWGW",
            "WGWWWWWWGW",
            "WBGGGGGGBW",
            "WWWWWWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[1, 8], [8, 8], [8, 1]],
        [15, 15, 0, 0, 0],
        &[
            (FunctionId::F1, "F if blue { F2 } F1"),
            (FunctionId::F2, "R F"),
        ],
        ("Navigate the perimeter.", "Naviguez sur le périmètre."),
    ));

    levels.push(record(
        15,
        &[
            "WWWWWWWW",
            "WGGGGGGW",
            "WWWWWWGW",
            "WWWKKWGW",
            "WWWKKGGW",
            "WWWWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[3, 3], [3, 4], [4, 3], [4, 4]],
        [15, 15, 15, 0, 0],
        &[
            (FunctionId::F1, "F2 F2 F R F F F R F F if green { F3 }"),
            (FunctionId::F2, "F F"),
            (FunctionId::F3, "F R"),
        ],
        ("Green triggers everywhere.", "Déclencheurs verts partout."),
    ));

    levels.push(record(
        16,
        &[
            "WWWWWW",
            "WGGGGW",
            "WGBBBW",
            "WGGGGW",
            "WWWWWW",
            "WWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[3, 1]],
        [20, 0, 0, 0, 0],
        &[
            (FunctionId::F1, "F F F R F F R F F F"),
        ],
        ("A long detour.", "Un long détour."),
    ));

    levels.push(record(
        17,
        &[
            "WWWWWWW",
            "WGGGGBW",
            "WRGGGGW",
            "WGGGGBW",
            "WWWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[3, 5]],
        [10, 10, 10, 0, 0],
        &[
            (FunctionId::F1, "F if blue { F2 } if red { F3 } F1"),
            (FunctionId::F2, "R F R"),
            (FunctionId::F3, "L F L"),
        ],
        ("Complex maze logic.", "Logique de labyrinthe complexe."),
    ));

    levels.push(record(
        18,
        &[
            "WWWWWWWWWWWWWWWWWWW",
            "WGGGGGGGGGGGGGGGGGW",
            "WWWWWWWWWWWWWWWWWWW",
        ],
        (1, 1, Facing::Right),
        &[[1, 17]],
        [2, 2, 2, 2, 1],
        &[
            (FunctionId::F1, "F2 F2"),
            (FunctionId::F2, "F3 F3"),
            (FunctionId::F3, "F4 F4"),
            (FunctionId::F4, "F5 F5"),
            (FunctionId::F5, "F"),
        ],
        ("Master of nested calls.", "Maître des appels imbriqués."),
    ));

    levels
}

/// Validate the built-in campaign into a catalogue.
///
/// # Errors
///
/// Returns [`WorldError`] if a hard-coded level is malformed (covered by
/// tests, so this should not happen in a release build).
pub fn builtin_campaign() -> Result<LevelCatalogue, WorldError> {
    LevelCatalogue::from_records(builtin_records())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn campaign_validates() {
        let catalogue = builtin_campaign().unwrap();
        assert_eq!(catalogue.len(), CAMPAIGN_LEN);
        assert_eq!(catalogue.first().map(|l| l.id()), Some(1));
    }

    #[test]
    fn ids_are_consecutive() {
        let ids: Vec<u32> = builtin_records().iter().map(|r| r.id).collect();
        let expected: Vec<u32> = (1..=18).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn every_level_ships_a_solution_and_text() {
        for record in builtin_records() {
            assert!(
                record.reference_solution.contains_key(&FunctionId::F1),
                "level {} has no F1 solution",
                record.id
            );
            assert!(!record.instructions.en.is_empty());
            assert!(!record.instructions.fr.is_empty());
        }
    }

    #[test]
    fn rows_are_rectangular() {
        for record in builtin_records() {
            let widths: Vec<usize> = record.grid.lines().map(str::len).collect();
            assert!(
                widths.iter().all(|w| *w == widths.first().copied().unwrap_or(0)),
                "level {} is ragged",
                record.id
            );
        }
    }
}
