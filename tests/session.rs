//! End-to-end sessions: feed command lines through the engine and compare
//! the full output stream against the expected line protocol.

use procdb::Engine;

fn run_session(script: &[&str]) -> Vec<String> {
    let mut engine = Engine::new();
    script
        .iter()
        .flat_map(|line| engine.execute_line(line))
        .collect()
}

#[test]
fn test_basic_session() {
    let output = run_session(&[
        "insert pid=1,name=\"p1\",priority=5,kern_tm='01:02:03',\
         file_tm='04:05:06',cpu_usage=12.5,status='running'",
        "select pid,name pid>0",
    ]);

    assert_eq!(
        output,
        vec!["insert:1", "select:1", "pid=1 name=\"p1\""]
    );
}

#[test]
fn test_full_lifecycle_session() {
    let output = run_session(&[
        "insert pid=1,name=\"a\",priority=5,kern_tm='01:00:00',\
         file_tm='01:00:00',cpu_usage=1,status='running'",
        "insert pid=2,name=\"b\",priority=5,kern_tm='02:00:00',\
         file_tm='02:00:00',cpu_usage=2,status='ready'",
        "insert pid=3,name=\"c\",priority=9,kern_tm='03:00:00',\
         file_tm='03:00:00',cpu_usage=3,status='ready'",
        // stable multi-key ordering
        "sort priority=desc,pid=asc",
        "select pid",
        // dedup on priority keeps the earlier record
        "uniq priority",
        "select pid,priority",
        // update with one bad assignment still counts the match
        "update name=\"z\",cpu_usage=oops pid=3",
        "select pid,name,cpu_usage pid=3",
        // delete everything
        "delete",
        "select pid",
    ]);

    assert_eq!(
        output,
        vec![
            "insert:1",
            "insert:2",
            "insert:3",
            "sort:3",
            "select:3",
            "pid=3",
            "pid=1",
            "pid=2",
            "uniq:1",
            "select:2",
            "pid=3 priority=9",
            "pid=1 priority=5",
            "update:1",
            "select:1",
            "pid=3 name=\"z\" cpu_usage=3.00",
            "delete:2",
            "select:0",
        ]
    );
}

#[test]
fn test_rejections_do_not_stop_the_session() {
    let output = run_session(&[
        "bogus command",
        "insert pid=1",
        "insert pid=1,name=\"p1\",priority=5,kern_tm='01:02:03',\
         file_tm='04:05:06',cpu_usage=12.5,status='running'",
        "select pid status<'running'",
        "select pid",
    ]);

    assert_eq!(
        output,
        vec![
            "incorrect:'bogus command'",
            "incorrect:'insert pid=1'",
            "insert:1",
            "incorrect:'select pid status<'r'",
            "select:1",
            "pid=1",
        ]
    );
}

#[test]
fn test_string_escapes_survive_a_round_trip() {
    let output = run_session(&[
        "insert pid=1,name=\"a\\\"b\\\\c\",priority=0,kern_tm='0:0:0',\
         file_tm='0:0:0',cpu_usage=0,status='paused'",
        "select name",
    ]);

    assert_eq!(
        output,
        vec!["insert:1", "select:1", "name=\"a\\\"b\\\\c\""]
    );
}
