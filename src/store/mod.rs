mod types;

pub use types::*;

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Session-scoped dashboard data. Everything lives in process memory and is
/// dropped with the session; there is no durability requirement.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionData>>,
}

#[derive(Debug, Clone)]
struct SessionData {
    tasks: Vec<Task>,
    expenses: Vec<Expense>,
    portfolio: Vec<Holding>,
    books: Vec<Book>,
    budget_goal: f64,
    next_id: i64,
}

impl SessionData {
    fn seeded() -> Self {
        let now = Utc::now();
        let month_start = now.with_day(1).unwrap_or(now);

        Self {
            tasks: vec![
                Task {
                    id: 1,
                    title: "Finalize Q3 report".to_string(),
                    priority: Priority::High,
                    completed: false,
                },
                Task {
                    id: 2,
                    title: "Draft marketing email".to_string(),
                    priority: Priority::Medium,
                    completed: false,
                },
                Task {
                    id: 3,
                    title: "Book flight for conference".to_string(),
                    priority: Priority::Low,
                    completed: true,
                },
                Task {
                    id: 4,
                    title: "Schedule team meeting".to_string(),
                    priority: Priority::Medium,
                    completed: false,
                },
            ],
            expenses: vec![
                Expense {
                    id: 1,
                    description: "Groceries".to_string(),
                    amount: 75.43,
                    category: "Food".to_string(),
                    date: now,
                },
                Expense {
                    id: 2,
                    description: "Monthly Rent".to_string(),
                    amount: 1200.0,
                    category: "Housing".to_string(),
                    date: month_start,
                },
                Expense {
                    id: 3,
                    description: "Gas".to_string(),
                    amount: 45.20,
                    category: "Transport".to_string(),
                    date: now - Duration::days(2),
                },
                Expense {
                    id: 4,
                    description: "Dinner with friends".to_string(),
                    amount: 120.50,
                    category: "Entertainment".to_string(),
                    date: now - Duration::days(3),
                },
            ],
            portfolio: vec![
                holding("AAPL", "Apple Inc.", 10.0, 14520.2, 210.0, 1.45),
                holding("GOOGL", "Alphabet Inc.", 5.0, 11235.5, -80.0, -0.71),
                holding("TSLA", "Tesla, Inc.", 15.0, 20850.7, 540.0, 2.65),
                holding("AMZN", "Amazon.com, Inc.", 8.0, 10800.1, -120.0, -1.10),
            ],
            books: vec![
                Book {
                    id: 1,
                    title: "The Midnight Library".to_string(),
                    author: "Matt Haig".to_string(),
                    progress: 65,
                },
                Book {
                    id: 2,
                    title: "Project Hail Mary".to_string(),
                    author: "Andy Weir".to_string(),
                    progress: 20,
                },
                Book {
                    id: 3,
                    title: "Dune".to_string(),
                    author: "Frank Herbert".to_string(),
                    progress: 100,
                },
            ],
            budget_goal: 2000.0,
            next_id: 5,
        }
    }

    fn take_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn holding(
    ticker: &str,
    name: &str,
    shares: f64,
    price: f64,
    change: f64,
    change_percent: f64,
) -> Holding {
    Holding {
        ticker: ticker.to_string(),
        name: name.to_string(),
        shares,
        price,
        change,
        change_percent,
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a session pre-populated with starter data and returns its id.
    pub fn create_session(&self) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();

        let mut sessions = self.lock()?;
        sessions.insert(session_id.clone(), SessionData::seeded());

        info!("Created session: {}", session_id);
        Ok(session_id)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionData>>> {
        self.sessions
            .lock()
            .map_err(|e| Error::internal(format!("Mutex lock failed: {e}")))
    }

    fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut SessionData) -> Result<T>,
    ) -> Result<T> {
        let mut sessions = self.lock()?;
        let data = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        f(data)
    }

    pub fn tasks(&self, session_id: &str) -> Result<Vec<Task>> {
        self.with_session(session_id, |data| Ok(data.tasks.clone()))
    }

    pub fn add_task(&self, session_id: &str, title: String, priority: Priority) -> Result<Task> {
        self.with_session(session_id, |data| {
            let task = Task {
                id: data.take_id(),
                title,
                priority,
                completed: false,
            };
            data.tasks.push(task.clone());
            debug!("Added task {} to session {}", task.id, session_id);
            Ok(task)
        })
    }

    pub fn toggle_task(&self, session_id: &str, task_id: i64) -> Result<Task> {
        self.with_session(session_id, |data| {
            let task = data
                .tasks
                .iter_mut()
                .find(|t| t.id == task_id)
                .ok_or_else(|| Error::not_found(format!("task {task_id}")))?;
            task.completed = !task.completed;
            Ok(task.clone())
        })
    }

    pub fn delete_task(&self, session_id: &str, task_id: i64) -> Result<()> {
        self.with_session(session_id, |data| {
            let before = data.tasks.len();
            data.tasks.retain(|t| t.id != task_id);
            if data.tasks.len() == before {
                return Err(Error::not_found(format!("task {task_id}")));
            }
            Ok(())
        })
    }

    pub fn expenses(&self, session_id: &str) -> Result<Vec<Expense>> {
        self.with_session(session_id, |data| Ok(data.expenses.clone()))
    }

    pub fn add_expense(
        &self,
        session_id: &str,
        description: String,
        amount: f64,
        category: String,
        date: DateTime<Utc>,
    ) -> Result<Expense> {
        self.with_session(session_id, |data| {
            let expense = Expense {
                id: data.take_id(),
                description,
                amount,
                category,
                date,
            };
            data.expenses.push(expense.clone());
            debug!("Added expense {} to session {}", expense.id, session_id);
            Ok(expense)
        })
    }

    pub fn portfolio(&self, session_id: &str) -> Result<Vec<Holding>> {
        self.with_session(session_id, |data| Ok(data.portfolio.clone()))
    }

    pub fn add_holding(&self, session_id: &str, ticker: String, shares: f64) -> Result<Holding> {
        self.with_session(session_id, |data| {
            let ticker = ticker.to_uppercase();
            let holding = Holding {
                name: format!("{ticker} Inc."),
                ticker,
                shares,
                price: rand::thread_rng().gen_range(0.0..50_000.0),
                change: 0.0,
                change_percent: 0.0,
            };
            data.portfolio.push(holding.clone());
            Ok(holding)
        })
    }

    pub fn remove_holding(&self, session_id: &str, ticker: &str) -> Result<()> {
        self.with_session(session_id, |data| {
            let before = data.portfolio.len();
            data.portfolio.retain(|h| h.ticker != ticker);
            if data.portfolio.len() == before {
                return Err(Error::not_found(format!("holding {ticker}")));
            }
            Ok(())
        })
    }

    /// Applies one random-walk step to every quote: the price moves by a
    /// uniform amount in (-100, 100), floored at zero, and change figures are
    /// recomputed against the previous close (price minus current change).
    pub fn refresh_quotes(&self, session_id: &str) -> Result<Vec<Holding>> {
        self.with_session(session_id, |data| {
            let mut rng = rand::thread_rng();
            for holding in &mut data.portfolio {
                let previous_close = holding.price - holding.change;
                let delta: f64 = rng.gen_range(-100.0..100.0);
                let price = (holding.price + delta).max(0.0);

                holding.price = price;
                holding.change = price - previous_close;
                holding.change_percent = if previous_close != 0.0 {
                    holding.change / previous_close * 100.0
                } else {
                    0.0
                };
            }
            Ok(data.portfolio.clone())
        })
    }

    pub fn books(&self, session_id: &str) -> Result<Vec<Book>> {
        self.with_session(session_id, |data| Ok(data.books.clone()))
    }

    pub fn add_book(
        &self,
        session_id: &str,
        title: String,
        author: String,
        progress: u8,
    ) -> Result<Book> {
        self.with_session(session_id, |data| {
            let book = Book {
                id: data.take_id(),
                title,
                author,
                progress,
            };
            data.books.push(book.clone());
            Ok(book)
        })
    }

    /// Derives the last-week activity snapshot the personal-challenges flow
    /// takes as input. Pages read is approximated from reading progress.
    pub fn summary(&self, session_id: &str) -> Result<ActivitySummary> {
        self.with_session(session_id, |data| {
            let week_ago = Utc::now() - Duration::days(7);

            Ok(ActivitySummary {
                tasks_completed: data.tasks.iter().filter(|t| t.completed).count() as u32,
                pages_read: data.books.iter().map(|b| b.progress as u32).sum(),
                spending_last_week: data
                    .expenses
                    .iter()
                    .filter(|e| e.date >= week_ago)
                    .map(|e| e.amount)
                    .sum(),
                current_budget_goal: data.budget_goal,
            })
        })
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
