//! Demonstration of stores and composition: a todo app

use serde_json::json;
use statebox::{compose, create_store, ActionSet, Composer, Definition, Value};

fn todo_actions() -> ActionSet {
    ActionSet::new()
        .action("reset", |_, _| Value::empty_list())
        .action("add", |todos, args| {
            let title = args.first().cloned().unwrap_or_default();
            let id = todos.len().unwrap_or(0);
            todos.push(Value::from(json!({"id": id, "completed": false})));
            todos.at(id).insert("title", title);
            todos
        })
        .action("toggle", |todos, args| {
            let id = args.first().and_then(Value::as_f64).unwrap_or(0.0) as usize;
            let todo = todos.at(id);
            let completed = todo.get("completed").as_bool().unwrap_or(false);
            todo.insert("completed", !completed);
            todos
        })
}

fn filter_actions() -> ActionSet {
    ActionSet::new().action("show", |_, args| args.first().cloned().unwrap_or_default())
}

fn print_todos(todos: &Value) {
    for i in 0..todos.len().unwrap_or(0) {
        let todo = todos.at(i);
        let status = if todo.get("completed").as_bool() == Some(true) {
            "✓"
        } else {
            " "
        };
        println!("   [{}] {}", status, todo.get("title").as_str().unwrap_or(""));
    }
}

fn main() {
    println!("=== Store Example: Todo App ===\n");

    let todos = create_store(todo_actions());
    let filter = create_store(filter_actions());
    todos.dispatch("reset", &[]).unwrap();
    filter.dispatch("show", &[Value::from("all")]).unwrap();

    // Aggregate view with statistics
    println!("1. Composing the app store");
    let app = Composer::new(Definition::map([("todos", &todos), ("filter", &filter)]))
        .transform(|state| {
            let todos = state.get("todos");
            let total = todos.len().unwrap_or(0);
            let completed = (0..total)
                .filter(|&i| todos.at(i).get("completed").as_bool() == Some(true))
                .count();
            state.insert("stats", json!({"total": total, "completed": completed}));
            state
        })
        .build();

    app.subscribe(|state| {
        let stats = state.get("stats");
        println!(
            "   [Store Update] Total: {}, Completed: {}, Filter: {}",
            stats.get("total").as_f64().unwrap_or(0.0),
            stats.get("completed").as_f64().unwrap_or(0.0),
            state.get("filter").as_str().unwrap_or("")
        );
    });

    println!("\n2. Adding todos through the app store");
    for title in ["Learn Rust", "Build a store", "Write documentation"] {
        app.dispatch("add", &[Value::from(title)]).unwrap();
    }

    println!("\n3. Current todos:");
    print_todos(&app.get().get("todos"));

    println!("\n4. Completing first todo");
    app.dispatch("toggle", &[Value::from(0)]).unwrap();

    println!("\n5. Filtering to completed todos");
    app.dispatch("show", &[Value::from("completed")]).unwrap();

    // A second composition over the same stores
    let titles = compose(Definition::list([&todos]));
    println!("\n6. Titles view sees the same todos: {:?}", titles.get().at(0).len());

    println!("\n7. Final state: {:?}", app.get());
    println!("\n✓ Example complete!");
}
