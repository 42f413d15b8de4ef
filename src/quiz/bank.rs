use std::fmt;
use std::str::FromStr;

use crate::quiz::{Answer, Question, QuizError, TheoryBlock};

/// Every algorithm the tutor knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    BubbleSort,
    InsertionSort,
    SelectionSort,
    MergeSort,
    QuickSort,
    BinarySearch,
    LinearSearch,
    DepthFirstSearch,
    BreadthFirstSearch,
    Dijkstra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Category {
    Sorting,
    Search,
    Graphs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TopicInfo {
    pub title: &'static str,
    pub description: &'static str,
    pub complexity: &'static str,
    pub difficulty: Difficulty,
    pub category: Category,
}

impl Topic {
    pub fn all() -> &'static [Topic] {
        &[
            Topic::BubbleSort,
            Topic::InsertionSort,
            Topic::SelectionSort,
            Topic::MergeSort,
            Topic::QuickSort,
            Topic::BinarySearch,
            Topic::LinearSearch,
            Topic::DepthFirstSearch,
            Topic::BreadthFirstSearch,
            Topic::Dijkstra,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Topic::BubbleSort => "bubble-sort",
            Topic::InsertionSort => "insertion-sort",
            Topic::SelectionSort => "selection-sort",
            Topic::MergeSort => "merge-sort",
            Topic::QuickSort => "quick-sort",
            Topic::BinarySearch => "binary-search",
            Topic::LinearSearch => "linear-search",
            Topic::DepthFirstSearch => "depth-first-search",
            Topic::BreadthFirstSearch => "breadth-first-search",
            Topic::Dijkstra => "dijkstra",
        }
    }

    pub fn from_slug(slug: &str) -> Result<Self, QuizError> {
        Topic::all()
            .iter()
            .copied()
            .find(|t| t.slug() == slug)
            .ok_or_else(|| QuizError::UnknownTopic(slug.to_string()))
    }

    pub fn info(&self) -> TopicInfo {
        use Category::*;
        use Difficulty::*;

        let (title, description, complexity, difficulty, category) = match self {
            Topic::BubbleSort => (
                "Bubble sort",
                "Repeatedly walks the list, compares neighbouring elements and swaps them when they are out of order.",
                "O(n²)",
                Easy,
                Sorting,
            ),
            Topic::InsertionSort => (
                "Insertion sort",
                "Builds the sorted array one element at a time by inserting each element into its place.",
                "O(n²)",
                Easy,
                Sorting,
            ),
            Topic::SelectionSort => (
                "Selection sort",
                "Finds the minimum of the unsorted part and moves it to the front.",
                "O(n²)",
                Easy,
                Sorting,
            ),
            Topic::MergeSort => (
                "Merge sort",
                "Divide and conquer: sorts both halves and merges the sorted halves.",
                "O(n log n)",
                Medium,
                Sorting,
            ),
            Topic::QuickSort => (
                "Quick sort",
                "Partitions the array around a pivot and sorts the partitions recursively.",
                "O(n log n)",
                Medium,
                Sorting,
            ),
            Topic::BinarySearch => (
                "Binary search",
                "Finds an element of a sorted array by repeatedly halving the search range.",
                "O(log n)",
                Easy,
                Search,
            ),
            Topic::LinearSearch => (
                "Linear search",
                "Checks every element in turn until the wanted one is found.",
                "O(n)",
                Easy,
                Search,
            ),
            Topic::DepthFirstSearch => (
                "Depth-first search (DFS)",
                "Traverses a graph by following each branch as far as possible before backtracking.",
                "O(V + E)",
                Medium,
                Graphs,
            ),
            Topic::BreadthFirstSearch => (
                "Breadth-first search (BFS)",
                "Traverses a graph level by level, visiting all neighbours before going deeper.",
                "O(V + E)",
                Medium,
                Graphs,
            ),
            Topic::Dijkstra => (
                "Dijkstra's algorithm",
                "Finds shortest paths from a source vertex in a graph with non-negative weights.",
                "O((V + E) log V)",
                Hard,
                Graphs,
            ),
        };

        TopicInfo {
            title,
            description,
            complexity,
            difficulty,
            category,
        }
    }

    /// Ordered theory blocks of the topic. Topics without authored theory
    /// return an empty sequence.
    pub fn blocks(&self) -> Vec<TheoryBlock> {
        match self {
            Topic::BubbleSort => bubble_sort_blocks(),
            _ => Vec::new(),
        }
    }

    pub fn has_theory(&self) -> bool {
        !self.blocks().is_empty()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Topic {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::from_slug(s)
    }
}

fn four(options: [(&str, bool); 4]) -> Vec<Answer> {
    ["a", "b", "c", "d"]
        .iter()
        .zip(options)
        .map(|(id, (text, correct))| Answer::new(id, text, correct))
        .collect()
}

fn bubble_sort_blocks() -> Vec<TheoryBlock> {
    vec![
        TheoryBlock::new(
            "1",
            "Introduction to bubble sort",
            "Bubble sort is one of the simplest sorting algorithms. It walks through the list, \
             compares each pair of neighbours and swaps them when they are in the wrong order. \
             Large elements drift to the end of the array the way air bubbles rise in water.",
            Question::new(
                "q1",
                "Why is the algorithm called 'bubble sort'?",
                four([
                    ("Because it is as fast as air bubbles", false),
                    ("Because elements 'float up' to their places like bubbles in water", true),
                    ("Because it creates bubbles in memory", false),
                    ("Because it was invented by someone named Bubble", false),
                ]),
                "The name reflects how the algorithm looks while running: elements 'float up' to their places like air bubbles in water.",
            ),
        ),
        TheoryBlock::new(
            "2",
            "History of the algorithm",
            "Bubble sort was described in the 1950s. Memory was extremely expensive at the time, \
             and the algorithm sorts in place without any extra buffers, which made it popular \
             despite its speed.",
            Question::new(
                "q2",
                "Why was bubble sort popular in the 1950s and 1960s?",
                four([
                    ("It was the fastest", false),
                    ("It needed no extra memory, and memory was expensive", true),
                    ("No other algorithms existed", false),
                    ("It was invented at that time", false),
                ]),
                "In the 1950s and 1960s memory was extremely expensive. Bubble sort needs no additional memory, which was critical.",
            ),
        ),
        TheoryBlock::new(
            "3",
            "How the algorithm works",
            "One pass compares elements 0 and 1, then 1 and 2, and so on, swapping out-of-order \
             pairs. Passes repeat until a pass performs no swaps. Example: [5, 2, 8, 1, 9] becomes \
             [2, 5, 1, 8, 9], then [2, 1, 5, 8, 9], then [1, 2, 5, 8, 9].",
            Question::new(
                "q3",
                "How many passes does it take to sort an array of 5 elements in the worst case?",
                four([
                    ("3 passes", false),
                    ("4 passes", true),
                    ("5 passes", false),
                    ("10 passes", false),
                ]),
                "An array of n elements needs n-1 passes. For 5 elements that is 4 passes.",
            ),
        ),
        TheoryBlock::new(
            "4",
            "Passes in detail",
            "After the first pass the largest element is guaranteed to sit at the end. After the \
             second pass the second largest sits before it. Every pass can therefore stop one \
             position earlier than the previous one.",
            Question::new(
                "q4",
                "What happens after each full pass over the array?",
                four([
                    ("The first element reaches its place", false),
                    ("All elements become partially sorted", false),
                    ("The largest unsorted element reaches its place on the right", true),
                    ("The elements get shuffled", false),
                ]),
                "After each pass the largest of the remaining unsorted elements is guaranteed to end up at the end of the array.",
            ),
        ),
        TheoryBlock::new(
            "5",
            "Time complexity O(n²)",
            "Two nested loops walk the array, so the number of comparisons grows with the square \
             of the input: 10 elements take about 100 operations, 10 000 elements about \
             100 000 000. The best case on an already sorted array with an early exit is O(n).",
            Question::new(
                "q5",
                "What is the worst-case time complexity of bubble sort?",
                four([
                    ("O(n)", false),
                    ("O(n log n)", false),
                    ("O(n²)", true),
                    ("O(2ⁿ)", false),
                ]),
                "Bubble sort has two nested loops, which gives quadratic worst-case time complexity O(n²).",
            ),
        ),
        TheoryBlock::new(
            "6",
            "Practical use",
            "Bubble sort is rarely used in production. It is fine for tiny or nearly sorted inputs \
             and for teaching. Large inputs call for quick sort, merge sort or the standard \
             library sort.",
            Question::new(
                "q6",
                "When can bubble sort be an acceptable choice?",
                four([
                    ("Sorting a million database records", false),
                    ("Sorting search results on a website", false),
                    ("Sorting 5 items picked by the user", true),
                    ("Sorting files on a hard drive", false),
                ]),
                "For very small arrays (5-10 elements) bubble sort is acceptable: the performance difference is invisible and the code is simple.",
            ),
        ),
    ]
}

/// Questions of the standalone practice quiz.
pub fn practice_questions() -> Vec<Question> {
    vec![
        Question::new(
            "practice-1",
            "What is the time complexity of bubble sort?",
            four([
                ("O(n)", false),
                ("O(n²)", true),
                ("O(log n)", false),
                ("O(n log n)", false),
            ]),
            "Bubble sort has two nested loops, which gives quadratic complexity O(n²).",
        ),
        Question::new(
            "practice-2",
            "What does binary search require?",
            four([
                ("The array must be sorted", true),
                ("The array must contain unique elements", false),
                ("The array must contain numbers", false),
                ("The array must have an even length", false),
            ]),
            "Binary search only works on sorted arrays because it halves the range on every step.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn slugs_round_trip() {
        for topic in Topic::all() {
            assert_eq!(Topic::from_slug(topic.slug()), Ok(*topic));
            assert_eq!(topic.to_string().parse::<Topic>(), Ok(*topic));
        }
    }

    #[test]
    fn unknown_slug_is_an_error() {
        assert_eq!(
            "bogo-sort".parse::<Topic>(),
            Err(QuizError::UnknownTopic("bogo-sort".to_string()))
        );
    }

    #[test]
    fn serde_uses_slugs() {
        let json = serde_json::to_string(&Topic::DepthFirstSearch).unwrap();
        assert_eq!(json, "\"depth-first-search\"");
    }

    #[test]
    fn bubble_sort_theory_is_well_formed() {
        let blocks = Topic::BubbleSort.blocks();
        assert_eq!(blocks.len(), 6);

        let ids: HashSet<_> = blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids.len(), blocks.len());

        for block in &blocks {
            assert!(block.question.validate().is_ok(), "block {}", block.id);
        }
    }

    #[test]
    fn only_bubble_sort_has_theory() {
        assert!(Topic::BubbleSort.has_theory());
        assert!(!Topic::Dijkstra.has_theory());
        assert_eq!(Topic::all().len(), 10);
    }

    #[test]
    fn practice_questions_are_well_formed() {
        for question in practice_questions() {
            assert!(question.validate().is_ok());
        }
        assert_eq!(Topic::BinarySearch.info().complexity, "O(log n)");
        assert_eq!(Topic::Dijkstra.info().difficulty, Difficulty::Hard);
    }
}
