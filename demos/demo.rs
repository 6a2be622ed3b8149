use procdb::Engine;

fn main() {
    println!("procdb demo\n");

    let mut engine = Engine::new();

    let script = [
        "insert pid=1,name=\"init\",priority=0,kern_tm='00:00:01',\
         file_tm='00:00:02',cpu_usage=0.5,status='running'",
        "insert pid=42,name=\"worker\",priority=5,kern_tm='01:02:03',\
         file_tm='04:05:06',cpu_usage=12.5,status='ready'",
        "insert pid=43,name=\"worker\",priority=5,kern_tm='01:02:03',\
         file_tm='04:05:06',cpu_usage=12.5,status='sleeping'",
        "select pid,name,cpu_usage pid>0",
        "update priority=9 name=\"worker\"",
        "select pid,priority statusnot_in['running']",
        "sort priority=desc,pid=asc",
        "select pid",
        "uniq name,priority",
        "delete priority>=9",
        "select pid,name",
        "this is not a command",
    ];

    for line in script {
        println!("> {line}");
        for out in engine.execute_line(line) {
            println!("{out}");
        }
    }

    println!(
        "\nstore holds {} record(s), ~{} bytes",
        engine.store().len(),
        engine.store().approx_heap_size()
    );
}
