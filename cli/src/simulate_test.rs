use super::*;

fn args(participants: usize, rounds: usize) -> SimulateArgs {
    SimulateArgs { participants, rounds, moves: 3, seed: 7, evict_peers: false }
}

fn cues(round: &Value) -> Vec<Vec<f64>> {
    round["cues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["cue"].as_array().unwrap().iter().map(|w| w.as_f64().unwrap()).collect())
        .collect()
}

#[tokio::test]
async fn every_round_reports_every_participant() {
    let report = run(&ClientConfig::default(), args(3, 2)).await.unwrap();
    let rounds = report["rounds"].as_array().unwrap();
    assert_eq!(rounds.len(), 2);
    assert_eq!(rounds[0]["answers"].as_array().unwrap().len(), 3);
    assert_eq!(rounds[1]["answers"].as_array().unwrap().len(), 4);
    for round in rounds {
        assert_eq!(round["cues"].as_array().unwrap().len(), 3);
    }
}

#[tokio::test]
async fn settled_cues_agree() {
    let report = run(&ClientConfig::default(), args(4, 1)).await.unwrap();
    let cues = cues(&report["rounds"][0]);
    for cue in &cues[1..] {
        assert_eq!(cue.len(), cues[0].len());
        for (a, b) in cue.iter().zip(&cues[0]) {
            assert!((a - b).abs() < 1e-6, "{cues:?}");
        }
    }
}

#[tokio::test]
async fn single_participant_cue_is_its_own_vector() {
    let report = run(&ClientConfig::default(), args(1, 1)).await.unwrap();
    let entry = &report["rounds"][0]["cues"][0];
    assert_eq!(entry["cue"], entry["local"]);
    assert_eq!(entry["participant_id"], "1");
}

#[tokio::test]
async fn rejects_empty_simulation() {
    let err = run(&ClientConfig::default(), args(0, 1)).await.unwrap_err();
    assert!(matches!(err, CliError::InvalidArgument(_)));
}

#[test]
fn pointer_host_tracks_listener_balance() {
    let mut pointer = Pointer::default();
    {
        let drag = DragSession::press(&mut pointer, WINDOW);
        drop(drag);
    }
    assert_eq!(pointer.attached, 0);
}

#[tokio::test]
async fn session_reports_the_last_round_question() {
    let report = run(&ClientConfig::default(), args(2, 2)).await.unwrap();
    assert_eq!(report["rounds"][1]["question_id"], "2");
    assert_eq!(report["question_id"], "2");
}

#[test]
fn board_points_land_inside_the_window() {
    for board in [Point::new(-BOARD_HALF_EXTENT, -BOARD_HALF_EXTENT), Point::new(BOARD_HALF_EXTENT, BOARD_HALF_EXTENT)] {
        let screen = WINDOW.board_to_screen(board);
        assert!(screen.x >= WINDOW.left && screen.x <= WINDOW.left + WINDOW.width, "{screen:?}");
        assert!(screen.y >= WINDOW.top && screen.y <= WINDOW.top + WINDOW.height, "{screen:?}");
        let back = WINDOW.screen_to_board(screen);
        assert!((back.x - board.x).abs() < 1e-9 && (back.y - board.y).abs() < 1e-9);
    }
}
